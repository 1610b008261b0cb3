// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP error mapping. Every failure leaves as a status code plus a
//! `{"error": "..."}` body; internal details are logged, never returned.

use crate::application::auth::AuthError;
use crate::application::lifecycle::LifecycleError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Self::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m) => m,
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::NotFound => Self::NotFound(message),
            LifecycleError::Forbidden(_) => Self::Forbidden(message),
            LifecycleError::Conflict(_) => Self::Conflict(message),
            LifecycleError::Validation(_) => Self::BadRequest(message),
            LifecycleError::Repository(_) => Self::Internal(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::MissingToken | AuthError::InvalidCredentials => Self::Unauthorized(message),
            AuthError::InvalidToken | AuthError::Forbidden(_) => Self::Forbidden(message),
            AuthError::Validation(_) => Self::BadRequest(message),
            AuthError::EmailTaken => Self::Conflict(message),
            AuthError::UserNotFound => Self::NotFound(message),
            AuthError::Repository(_) | AuthError::Hash(_) | AuthError::Token(_) => Self::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::DenyReason;

    #[test]
    fn test_lifecycle_error_status_codes() {
        assert_eq!(ApiError::from(LifecycleError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(LifecycleError::Forbidden(DenyReason::NotOwner)).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(LifecycleError::Conflict("Application already submitted".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(LifecycleError::Validation("Missing required file field: filename".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(ApiError::from(AuthError::MissingToken).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InvalidCredentials).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InvalidToken).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(AuthError::EmailTaken).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let response = ApiError::Internal("pool timed out".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
