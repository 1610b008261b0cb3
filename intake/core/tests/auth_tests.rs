// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use common::{harness, Harness};
use std::sync::Arc;
use udmt_core::application::{AuthError, AuthGate, AuthService, LifecycleSettings};
use udmt_core::domain::credentials::TokenService;
use udmt_core::domain::principal::Role;
use udmt_core::domain::repository::UserRepository;
use udmt_core::infrastructure::JwtTokenService;

fn services(h: &Harness) -> (AuthService, AuthGate) {
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new("auth-test-secret").unwrap());
    let users: Arc<dyn UserRepository> = Arc::new(h.store.clone());
    (
        AuthService::new(users, h.hasher.clone(), tokens.clone()),
        AuthGate::new(tokens),
    )
}

async fn last_login(h: &Harness, email: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    UserRepository::find_by_email(&h.store, email)
        .await
        .unwrap()
        .unwrap()
        .last_login
}

#[tokio::test]
async fn test_wrong_password_leaves_last_login_untouched() {
    let h = harness(LifecycleSettings::default()).await;
    let (auth, _) = services(&h);

    let err = auth.login("applicantA@example.com", "nope").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(last_login(&h, "applicantA@example.com").await.is_none());

    let err = auth.login("nobody@example.com", "user123").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_issues_token_for_the_gate_and_records_login() {
    let h = harness(LifecycleSettings::default()).await;
    let (auth, gate) = services(&h);

    let response = auth.login("admin@example.com", "admin123").await.unwrap();
    assert_eq!(response.user.role, Role::Admin);
    assert!(last_login(&h, "admin@example.com").await.is_some());

    let principal = gate.authenticate_header(Some(&format!("Bearer {}", response.token))).unwrap();
    assert_eq!(principal, h.admin);
    gate.require_role(&principal, Role::Admin).unwrap();
}

#[tokio::test]
async fn test_register_creates_user_role_accounts_only_once() {
    let h = harness(LifecycleSettings::default()).await;
    let (auth, gate) = services(&h);

    let response = auth
        .register("operator@example.com", "flow-meter-9", "Canal Operator")
        .await
        .unwrap();
    assert_eq!(response.user.role, Role::User);

    let principal = gate.authenticate(Some(&response.token)).unwrap();
    let profile = auth.profile(&principal).await.unwrap();
    assert_eq!(profile.name, "Canal Operator");
    assert!(profile.last_login.is_none());

    let again = auth
        .register("operator@example.com", "other", "Someone Else")
        .await
        .unwrap_err();
    assert!(matches!(again, AuthError::EmailTaken));

    let missing = auth.register("x@example.com", "", "X").await.unwrap_err();
    assert!(matches!(missing, AuthError::Validation(_)));
}
