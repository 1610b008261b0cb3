// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # REST API
//!
//! Axum router for the intake portal. Handlers are thin: they pull the
//! principal out of the `Authorization` header, call the lifecycle or auth
//! service and serialize the result. All rules live below this layer.

use crate::application::auth::{AuthGate, AuthService};
use crate::application::lifecycle::ApplicationLifecycleService;
use crate::domain::application::{ApplicationId, ApplicationPatch, ApplicationStatus};
use crate::domain::attachment::FileMetadata;
use crate::domain::config::ServerConfig;
use crate::domain::form_data::FormData;
use crate::domain::principal::{Principal, Role};
use crate::presentation::error::ApiError;
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, FromRequestParts, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub lifecycle: Arc<dyn ApplicationLifecycleService>,
    pub auth: Arc<AuthService>,
    pub gate: AuthGate,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(lifecycle: Arc<dyn ApplicationLifecycleService>, auth: Arc<AuthService>, gate: AuthGate) -> Self {
        Self {
            lifecycle,
            auth,
            gate,
            started_at: Instant::now(),
        }
    }
}

/// Principal behind the request's bearer token.
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AuthenticatedPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
        let principal = state.gate.authenticate_header(header)?;
        Ok(Self(principal))
    }
}

pub fn app(state: Arc<AppState>, config: &ServerConfig) -> anyhow::Result<Router> {
    let applications = Router::new()
        .route("/", get(list_own_handler).post(create_handler))
        .route("/admin/all", get(list_all_handler))
        .route(
            "/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/{id}/submit", post(submit_handler))
        .route("/{id}/files", get(list_files_handler).post(attach_file_handler))
        .route("/{id}/audit", get(audit_handler));

    let auth = Router::new()
        .route("/login", post(login_handler))
        .route("/register", post(register_handler))
        .route("/profile", get(profile_handler));

    let router = Router::new()
        .route("/api/health", get(health_handler))
        .nest("/api/auth", auth)
        .nest("/api/applications", applications)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        let value = HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin: {}", origin))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

fn application_id(path: Result<Path<i64>, PathRejection>) -> Result<ApplicationId, ApiError> {
    let Path(id) = path?;
    Ok(ApplicationId(id))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let response = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let response = state
        .auth
        .register(&request.email, &request.password, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn profile_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.profile(&principal).await?))
}

async fn list_own_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.lifecycle.list_own(&principal).await?))
}

#[derive(Debug, Default, Deserialize)]
struct CreateRequest {
    #[serde(default)]
    form_data: Value,
}

/// The body is optional; an empty one creates a blank draft.
async fn create_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateRequest = if body.is_empty() {
        CreateRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };
    let initial = FormData::from_value(request.form_data).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let application = state.lifecycle.create(&principal, initial).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Debug, Deserialize)]
struct ListAllQuery {
    status: Option<String>,
}

async fn list_all_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    query: Result<Query<ListAllQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Admin check comes before the query is looked at
    state.gate.require_role(&principal, Role::Admin)?;

    let Query(query) = query?;
    let status = query
        .status
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ApplicationStatus>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(state.lifecycle.list_all(&principal, status).await?))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    Ok(Json(state.lifecycle.get(&principal, id).await?))
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ApplicationPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    let Json(patch) = payload?;
    Ok(Json(state.lifecycle.update(&principal, id, patch).await?))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    state.lifecycle.delete(&principal, id).await?;
    Ok(Json(json!({ "message": "Application deleted successfully" })))
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    Ok(Json(state.lifecycle.submit(&principal, id).await?))
}

async fn list_files_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    Ok(Json(state.lifecycle.list_files(&principal, id).await?))
}

async fn attach_file_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FileMetadata>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    let Json(metadata) = payload?;
    let file = state.lifecycle.attach_file(&principal, id, metadata).await?;
    Ok((StatusCode::CREATED, Json(file)))
}

async fn audit_handler(
    State(state): State<Arc<AppState>>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = application_id(path)?;
    Ok(Json(state.lifecycle.audit_trail(&principal, id).await?))
}
