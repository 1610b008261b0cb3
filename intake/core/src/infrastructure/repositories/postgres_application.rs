// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Application Repository
//!
//! Production `ApplicationRepository` backed by the `applications`,
//! `files` and `audit_log` tables. Form data is stored as JSONB.
//!
//! Each lifecycle operation gets its own `sqlx` transaction; `lock` takes a
//! `SELECT ... FOR UPDATE` row lock so the permission check, the write and
//! the audit entry see one consistent row. Dropping the transaction without
//! committing rolls it back.

use crate::domain::application::{
    Application, ApplicationId, ApplicationStatus, ApplicationWithOwner, NewApplication, OwnerSummary,
};
use crate::domain::attachment::{ApplicationFile, NewApplicationFile};
use crate::domain::audit::{AuditAction, AuditEntry, NewAuditEntry};
use crate::domain::form_data::FormData;
use crate::domain::principal::UserId;
use crate::domain::repository::{ApplicationRepository, ApplicationTransaction, RepositoryError};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction};
use tracing::debug;

const APPLICATION_COLUMNS: &str =
    "a.id, a.user_id, a.status, a.form_data, a.created_at, a.updated_at, a.submitted_at";

pub struct PostgresApplicationRepository {
    pool: PgPool,
}

impl PostgresApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn application_from_row(row: &PgRow) -> Result<Application, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<ApplicationStatus>()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let Json(form_data): Json<FormData> = row.try_get("form_data")?;

    Ok(Application {
        id: ApplicationId(row.try_get("id")?),
        owner_id: UserId(row.try_get("user_id")?),
        status,
        form_data,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        submitted_at: row.try_get("submitted_at")?,
    })
}

fn application_with_owner_from_row(row: &PgRow) -> Result<ApplicationWithOwner, RepositoryError> {
    Ok(ApplicationWithOwner {
        application: application_from_row(row)?,
        owner: OwnerSummary {
            name: row.try_get("owner_name")?,
            email: row.try_get("owner_email")?,
        },
    })
}

fn file_from_row(row: &PgRow) -> Result<ApplicationFile, RepositoryError> {
    Ok(ApplicationFile {
        id: row.try_get("id")?,
        application_id: ApplicationId(row.try_get("application_id")?),
        filename: row.try_get("filename")?,
        original_name: row.try_get("original_name")?,
        file_type: row.try_get("file_type")?,
        file_category: row.try_get("file_category")?,
        file_path: row.try_get("file_path")?,
        file_size: row.try_get("file_size")?,
        upload_date: row.try_get("upload_date")?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditEntry, RepositoryError> {
    let action: String = row.try_get("action")?;
    let action = action
        .parse::<AuditAction>()
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let application_id: Option<i64> = row.try_get("application_id")?;

    Ok(AuditEntry {
        id: row.try_get("id")?,
        application_id: application_id.map(ApplicationId),
        user_id: UserId(row.try_get("user_id")?),
        action,
        details: row.try_get("details")?,
        timestamp: row.try_get("timestamp")?,
    })
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    async fn begin(&self) -> Result<Box<dyn ApplicationTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresApplicationTransaction { tx }))
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<ApplicationWithOwner>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}, u.name AS owner_name, u.email AS owner_email
            FROM applications a
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#
        );
        let row = sqlx::query(&sql).bind(id.0).fetch_optional(&self.pool).await?;

        row.as_ref().map(application_with_owner_from_row).transpose()
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Application>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications a
            WHERE a.user_id = $1
            ORDER BY a.updated_at DESC, a.id DESC
            "#
        );
        let rows = sqlx::query(&sql).bind(owner.0).fetch_all(&self.pool).await?;

        rows.iter().map(application_from_row).collect()
    }

    async fn list_all(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithOwner>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}, u.name AS owner_name, u.email AS owner_email
            FROM applications a
            JOIN users u ON u.id = a.user_id
            WHERE ($1::text IS NULL OR a.status = $1)
            ORDER BY a.updated_at DESC, a.id DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(application_with_owner_from_row).collect()
    }

    async fn list_files(&self, id: ApplicationId) -> Result<Vec<ApplicationFile>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, filename, original_name, file_type, file_category,
                   file_path, file_size, upload_date
            FROM files
            WHERE application_id = $1
            ORDER BY upload_date, id
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(file_from_row).collect()
    }

    async fn audit_trail(&self, id: ApplicationId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, application_id, user_id, action, details, timestamp
            FROM audit_log
            WHERE application_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(audit_from_row).collect()
    }
}

pub struct PostgresApplicationTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ApplicationTransaction for PostgresApplicationTransaction {
    async fn insert(&mut self, application: NewApplication) -> Result<Application, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO applications (user_id, status, form_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id
            "#,
        )
        .bind(application.owner_id.0)
        .bind(ApplicationStatus::Draft.as_str())
        .bind(Json(&application.form_data))
        .bind(application.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(application.into_application(ApplicationId(id)))
    }

    async fn lock(&mut self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications a
            WHERE a.id = $1
            FOR UPDATE
            "#
        );
        let row = sqlx::query(&sql).bind(id.0).fetch_optional(&mut *self.tx).await?;

        row.as_ref().map(application_from_row).transpose()
    }

    async fn save(&mut self, application: &Application) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = $2, form_data = $3, updated_at = $4, submitted_at = $5
            WHERE id = $1
            "#,
        )
        .bind(application.id.0)
        .bind(application.status.as_str())
        .bind(Json(&application.form_data))
        .bind(application.updated_at)
        .bind(application.submitted_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("application {}", application.id)));
        }
        Ok(())
    }

    async fn delete(&mut self, id: ApplicationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("application {}", id)));
        }
        Ok(())
    }

    async fn attach_file(&mut self, file: NewApplicationFile) -> Result<ApplicationFile, RepositoryError> {
        let application_id = file.application_id;
        let upload_date = file.upload_date;
        let metadata = &file.metadata;
        let original_name = metadata.original_name.as_deref().unwrap_or(&metadata.filename);

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO files (
                application_id, filename, original_name, file_type,
                file_category, file_path, file_size, upload_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(application_id.0)
        .bind(&metadata.filename)
        .bind(original_name)
        .bind(&metadata.file_type)
        .bind(metadata.file_category.as_deref())
        .bind(&metadata.file_path)
        .bind(metadata.file_size)
        .bind(upload_date)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(file.into_file(id))
    }

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO audit_log (application_id, user_id, action, details, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(entry.application_id.map(|id| id.0))
        .bind(entry.user_id.0)
        .bind(entry.action.as_str())
        .bind(entry.details.as_deref())
        .bind(entry.timestamp)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(audit_id = id, action = entry.action.as_str(), "Audit entry appended");
        Ok(entry.into_entry(id))
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
