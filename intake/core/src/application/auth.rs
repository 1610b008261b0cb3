// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Authentication
//!
//! - [`AuthGate`] turns a bearer token into a [`Principal`] and checks roles.
//!   It is what every protected request goes through.
//! - [`AuthService`] issues tokens: login, self-registration and the
//!   profile lookup behind `/api/auth/profile`.
//!
//! A request without a token is `Unauthorized`; a token that fails
//! verification (bad signature, malformed, expired) is `Forbidden`.

use crate::domain::credentials::{CredentialHasher, HashError, SessionClaims, TokenError, TokenService};
use crate::domain::principal::{Principal, Role};
use crate::domain::repository::{RepositoryError, UserRepository};
use crate::domain::user::{NewUser, UserProfile, UserSummary};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Session token lifetime when none is configured.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;

/// Password whose digest stands in for unknown accounts during login.
const UNKNOWN_ACCOUNT_PASSWORD: &str = "udmt-unknown-account";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Token(TokenError),
}

/// Verifies bearer tokens for protected routes.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<dyn TokenService>,
}

impl AuthGate {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }

    /// Accepts the raw `Authorization` header value. Anything without a
    /// second whitespace-separated part counts as no token at all.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let token = header.and_then(|value| value.split_whitespace().nth(1));
        self.authenticate(token)
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;

        match self.tokens.verify(token) {
            Ok(claims) => Ok(claims.principal()),
            Err(err) => {
                debug!(error = %err, "Token rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }

    pub fn require_role(&self, principal: &Principal, role: Role) -> Result<(), AuthError> {
        if principal.role == role {
            Ok(())
        } else {
            Err(AuthError::Forbidden(match role {
                Role::Admin => "Admin access required",
                Role::User => "User access required",
            }))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenService>,
    token_ttl: Duration,
    /// Verified in place of a stored digest when the email is unknown.
    /// Hashed lazily with the configured hasher.
    unknown_account_digest: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            unknown_account_digest: OnceCell::new(),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Unknown email and wrong password fail the same way, both after one
    /// password verification, and leave `last_login` untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Email and password required"));
        }

        let user = match self.users.find_by_email(email).await? {
            Some(user) => {
                let verified = self.hasher.verify(&user.password_hash, password).await;
                verified.then_some(user)
            }
            None => {
                let digest = self.unknown_account_digest().await?;
                self.hasher.verify(digest, password).await;
                None
            }
        };
        let Some(user) = user else {
            metrics::counter!("udmt_logins_total", "outcome" => "failure").increment(1);
            warn!(email = %email, "Login failed");
            return Err(AuthError::InvalidCredentials);
        };

        let now = Utc::now();
        self.users.record_login(user.id, now).await?;
        let token = self.issue(&user.principal())?;

        metrics::counter!("udmt_logins_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

        Ok(LoginResponse {
            token,
            user: user.summary(),
        })
    }

    /// Self-registration always yields a `user` role account.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<LoginResponse, AuthError> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(AuthError::Validation("Email, password, and name required"));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .users
            .insert(NewUser {
                email: email.to_string(),
                name: name.to_string(),
                role: Role::User,
                password_hash,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| match err {
                // Lost a race with a concurrent registration
                RepositoryError::Duplicate(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue(&user.principal())?;
        info!(user_id = %user.id, "User registered");

        Ok(LoginResponse {
            token,
            user: user.summary(),
        })
    }

    pub async fn profile(&self, principal: &Principal) -> Result<UserProfile, AuthError> {
        self.users
            .find_by_id(principal.id)
            .await?
            .map(|user| user.profile())
            .ok_or(AuthError::UserNotFound)
    }

    async fn unknown_account_digest(&self) -> Result<&String, AuthError> {
        let digest = self
            .unknown_account_digest
            .get_or_try_init(|| self.hasher.hash(UNKNOWN_ACCOUNT_PASSWORD))
            .await?;
        Ok(digest)
    }

    fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        let claims = SessionClaims::for_principal(principal, Utc::now(), self.token_ttl);
        self.tokens.sign(&claims).map_err(AuthError::Token)
    }
}
