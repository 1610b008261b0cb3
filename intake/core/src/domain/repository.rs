// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Repository Ports
//!
//! Persistence interfaces for the two aggregates (users, applications).
//! Files and audit entries hang off applications and are written through
//! the same transaction as the application row they belong to.
//!
//! ## Transactions
//!
//! Every mutating lifecycle operation runs as
//! `begin → lock → check → mutate → audit → commit`. A transaction that is
//! dropped without `commit` rolls back, so a failure after partial work
//! leaves nothing behind.

use crate::domain::application::{
    Application, ApplicationId, ApplicationStatus, ApplicationWithOwner, NewApplication,
};
use crate::domain::attachment::{ApplicationFile, NewApplicationFile};
use crate::domain::audit::{AuditEntry, NewAuditEntry};
use crate::domain::principal::UserId;
use crate::domain::user::{NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Fails with [`RepositoryError::Duplicate`] when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Open a unit of work. Dropping it without `commit` rolls back.
    async fn begin(&self) -> Result<Box<dyn ApplicationTransaction>, RepositoryError>;

    /// Application joined with its owner's name and email.
    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<ApplicationWithOwner>, RepositoryError>;

    /// Applications owned by `owner`, most recently updated first.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Application>, RepositoryError>;

    /// Every application, optionally filtered by status, most recently
    /// updated first.
    async fn list_all(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithOwner>, RepositoryError>;

    async fn list_files(&self, id: ApplicationId) -> Result<Vec<ApplicationFile>, RepositoryError>;

    /// Audit entries referencing `id`, oldest first.
    async fn audit_trail(&self, id: ApplicationId) -> Result<Vec<AuditEntry>, RepositoryError>;
}

#[async_trait]
pub trait ApplicationTransaction: Send {
    async fn insert(&mut self, application: NewApplication) -> Result<Application, RepositoryError>;

    /// Load a row and hold it for the rest of the transaction.
    async fn lock(&mut self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;

    async fn save(&mut self, application: &Application) -> Result<(), RepositoryError>;

    /// Hard delete. Files cascade; audit rows keep existing with a null
    /// application reference.
    async fn delete(&mut self, id: ApplicationId) -> Result<(), RepositoryError>;

    async fn attach_file(&mut self, file: NewApplicationFile) -> Result<ApplicationFile, RepositoryError>;

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::Constraint(db_err.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
