// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for a running intake server.
//!
//! Also implements [`ApplicationGateway`], so a wizard session can be driven
//! against a remote server exactly as it is against the local service.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use udmt_core::application::{ApplicationGateway, GatewayError, LoginResponse};
use udmt_core::domain::application::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, ApplicationWithOwner,
};
use udmt_core::domain::form_data::FormData;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message} (HTTP {status})")]
    Status { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, message } => match status {
                StatusCode::NOT_FOUND => GatewayError::NotFound(message),
                StatusCode::UNAUTHORIZED => GatewayError::Unauthorized(message),
                StatusCode::FORBIDDEN => GatewayError::Forbidden(message),
                StatusCode::CONFLICT => GatewayError::Conflict(message),
                StatusCode::BAD_REQUEST => GatewayError::Validation(message),
                _ => GatewayError::Unavailable(message),
            },
            ClientError::Transport(err) => GatewayError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct IntakeClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl IntakeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            return Err(ClientError::Status { status, message });
        }

        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.send(self.client.get(self.url("/api/health"))).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.send(request).await
    }

    pub async fn list_own(&self) -> Result<Vec<Application>, ClientError> {
        self.send(self.client.get(self.url("/api/applications"))).await
    }

    pub async fn list_all(&self, status: Option<ApplicationStatus>) -> Result<Vec<ApplicationWithOwner>, ClientError> {
        let mut request = self.client.get(self.url("/api/applications/admin/all"));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        self.send(request).await
    }

    pub async fn get(&self, id: ApplicationId) -> Result<ApplicationWithOwner, ClientError> {
        self.send(self.client.get(self.url(&format!("/api/applications/{}", id))))
            .await
    }

    pub async fn create(&self, form_data: FormData) -> Result<Application, ClientError> {
        let request = self
            .client
            .post(self.url("/api/applications"))
            .json(&json!({ "form_data": form_data }));
        self.send(request).await
    }

    pub async fn update(&self, id: ApplicationId, patch: &ApplicationPatch) -> Result<Application, ClientError> {
        let request = self
            .client
            .put(self.url(&format!("/api/applications/{}", id)))
            .json(patch);
        self.send(request).await
    }

    pub async fn submit(&self, id: ApplicationId) -> Result<Application, ClientError> {
        self.send(self.client.post(self.url(&format!("/api/applications/{}/submit", id))))
            .await
    }

    pub async fn delete(&self, id: ApplicationId) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .send(self.client.delete(self.url(&format!("/api/applications/{}", id))))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationGateway for IntakeClient {
    async fn create(&self, form_data: FormData) -> Result<Application, GatewayError> {
        Ok(IntakeClient::create(self, form_data).await?)
    }

    async fn update(&self, id: ApplicationId, form_data: FormData) -> Result<Application, GatewayError> {
        Ok(IntakeClient::update(self, id, &ApplicationPatch::form_data(form_data)).await?)
    }

    async fn submit(&self, id: ApplicationId) -> Result<Application, GatewayError> {
        Ok(IntakeClient::submit(self, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const APPLICATION: &str = r#"{
        "id": 7,
        "user_id": 2,
        "status": "draft",
        "form_data": {"projectName": "Green River"},
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": "2026-03-01T10:00:00Z",
        "submitted_at": null
    }"#;

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::Json(json!({
                "email": "applicantA@example.com",
                "password": "user123"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"token":"t0k3n","user":{"id":2,"email":"applicantA@example.com","name":"Applicant A","role":"user"}}"#,
            )
            .create_async()
            .await;

        let client = IntakeClient::new(server.url()).unwrap();
        let response = client.login("applicantA@example.com", "user123").await.unwrap();

        assert_eq!(response.token, "t0k3n");
        assert_eq!(response.user.name, "Applicant A");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/applications")
            .match_header("authorization", "Bearer t0k3n")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", APPLICATION))
            .create_async()
            .await;

        let client = IntakeClient::new(server.url()).unwrap().with_token("t0k3n");
        let applications = client.list_own().await.unwrap();

        assert_eq!(applications.len(), 1);
        assert_eq!(applications[0].id, ApplicationId(7));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_becomes_gateway_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/applications/7/submit")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Application already submitted"}"#)
            .create_async()
            .await;

        let client = IntakeClient::new(server.url()).unwrap().with_token("t0k3n");
        let err = ApplicationGateway::submit(&client, ApplicationId(7)).await.unwrap_err();

        match err {
            GatewayError::Conflict(message) => assert_eq!(message, "Application already submitted"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gateway_update_sends_form_data_patch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/applications/7")
            .match_body(Matcher::Json(json!({ "form_data": { "projectName": "Green River" } })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(APPLICATION)
            .create_async()
            .await;

        let client = IntakeClient::new(server.url()).unwrap().with_token("t0k3n");
        let form = FormData::new().with("projectName", json!("Green River"));
        let updated = ApplicationGateway::update(&client, ApplicationId(7), form).await.unwrap();

        assert_eq!(updated.form_data.project_name(), Some("Green River"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_admin_listing_passes_status_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/applications/admin/all")
            .match_query(Matcher::UrlEncoded("status".into(), "submitted".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = IntakeClient::new(server.url()).unwrap().with_token("t0k3n");
        let listed = client.list_all(Some(ApplicationStatus::Submitted)).await.unwrap();

        assert!(listed.is_empty());
        mock.assert_async().await;
    }
}
