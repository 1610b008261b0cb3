// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Credential Ports
//!
//! Token signing and password hashing are consumed through these traits so
//! the auth gate never depends on a particular crypto backend. Production
//! adapters live in [`crate::infrastructure::jwt`] and
//! [`crate::infrastructure::password`].

use crate::domain::principal::{Principal, Role, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims embedded in a session token: the principal plus issue/expiry
/// times as unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn for_principal(principal: &Principal, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: principal.id.0,
            email: principal.email.clone(),
            role: principal.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(UserId(self.id), self.email.clone(), self.role)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

pub trait TokenService: Send + Sync {
    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError>;

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;
}

#[derive(Debug, Error)]
#[error("Failed to hash credential: {0}")]
pub struct HashError(pub String);

/// Password hashing is CPU-bound; adapters move the work off the async
/// executor.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `false` for a wrong password and for a digest that cannot be parsed.
    async fn verify(&self, digest: &str, plaintext: &str) -> bool;
}
