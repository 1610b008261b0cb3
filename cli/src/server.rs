// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `udmt serve`: wires storage, auth and the lifecycle service together and
//! runs the HTTP API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use udmt_core::application::{AuthGate, AuthService, LifecycleSettings, StandardApplicationLifecycleService};
use udmt_core::domain::config::IntakeConfigManifest;
use udmt_core::domain::credentials::{CredentialHasher, TokenService};
use udmt_core::domain::repository::{ApplicationRepository, UserRepository};
use udmt_core::infrastructure::db::Database;
use udmt_core::infrastructure::repositories::{
    InMemoryStore, PostgresApplicationRepository, PostgresUserRepository,
};
use udmt_core::infrastructure::seed::{seed_demo_users, seed_sample_applications};
use udmt_core::infrastructure::{Argon2CredentialHasher, JwtTokenService};
use udmt_core::presentation::{app, AppState};

/// Build the shared API state from configuration. Falls back to in-memory
/// storage when no database URL is configured.
pub async fn build_state(config: &IntakeConfigManifest) -> Result<Arc<AppState>> {
    let spec = &config.spec;

    let (users, applications): (Arc<dyn UserRepository>, Arc<dyn ApplicationRepository>) =
        match Database::from_config(&spec.database).await? {
            Some(db) => {
                info!("Using PostgreSQL storage");
                let pool = db.get_pool().clone();
                (
                    Arc::new(PostgresUserRepository::new(pool.clone())),
                    Arc::new(PostgresApplicationRepository::new(pool)),
                )
            }
            None => {
                warn!("No database URL configured, using in-memory storage (data is lost on restart)");
                let store = InMemoryStore::new();
                (Arc::new(store.clone()), Arc::new(store))
            }
        };

    if config.uses_dev_secret() {
        warn!("Using the built-in development JWT secret; set UDMT_JWT_SECRET in production");
    }

    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2CredentialHasher::new());
    let tokens: Arc<dyn TokenService> = Arc::new(
        JwtTokenService::new(&spec.auth.jwt_secret).context("Failed to initialize token service")?,
    );

    if spec.seed.demo_users {
        let created = seed_demo_users(users.as_ref(), hasher.as_ref()).await?;
        if created > 0 {
            info!(count = created, "Demo accounts created");
        }
    }

    if spec.seed.sample_applications {
        seed_sample_applications(users.as_ref(), applications.as_ref()).await?;
    }

    let lifecycle = Arc::new(StandardApplicationLifecycleService::new(
        applications,
        LifecycleSettings {
            enforce_step_completion: spec.lifecycle.enforce_step_completion,
        },
    ));
    let auth = Arc::new(
        AuthService::new(users, hasher, tokens.clone())
            .with_token_ttl(chrono::Duration::hours(i64::from(spec.auth.token_ttl_hours))),
    );

    Ok(Arc::new(AppState::new(lifecycle, auth, AuthGate::new(tokens))))
}

pub async fn run(config: IntakeConfigManifest) -> Result<()> {
    config.validate().context("Configuration validation failed")?;
    let server = &config.spec.server;

    let state = build_state(&config).await?;
    let router = app(state, server)?;

    let addr: SocketAddr = format!("{}:{}", server.bind_address, server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", server.bind_address, server.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        %addr,
        enforce_step_completion = config.spec.lifecycle.enforce_step_completion,
        "UDMT intake server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use udmt_core::application::ApplicationLifecycleService;
    use udmt_core::domain::form_data::FormData;

    #[tokio::test]
    async fn test_in_memory_state_is_seeded_and_usable() {
        let config = IntakeConfigManifest::default();
        let state = build_state(&config).await.unwrap();

        let login = state.auth.login("applicantA@example.com", "user123").await.unwrap();
        let principal = state.gate.authenticate(Some(&login.token)).unwrap();
        assert_eq!(principal.email, "applicantA@example.com");

        let created = state.lifecycle.create(&principal, FormData::new()).await.unwrap();
        assert_eq!(state.lifecycle.list_own(&principal).await.unwrap()[0].id, created.id);
    }

    #[tokio::test]
    async fn test_seeding_can_be_disabled() {
        let mut config = IntakeConfigManifest::default();
        config.spec.seed.demo_users = false;
        let state = build_state(&config).await.unwrap();

        assert!(state.auth.login("admin@example.com", "admin123").await.is_err());
    }

    #[tokio::test]
    async fn test_sample_applications_show_up_for_admin() {
        let mut config = IntakeConfigManifest::default();
        config.spec.seed.sample_applications = true;
        let state = build_state(&config).await.unwrap();

        let login = state.auth.login("admin@example.com", "admin123").await.unwrap();
        let admin = state.gate.authenticate(Some(&login.token)).unwrap();
        assert_eq!(state.lifecycle.list_all(&admin, None).await.unwrap().len(), 5);
    }
}
