// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod auth;
pub mod lifecycle;
pub mod wizard;

// Re-export services for convenience
pub use auth::{AuthError, AuthGate, AuthService, LoginResponse};
pub use lifecycle::{
    ApplicationLifecycleService, LifecycleError, LifecycleSettings, StandardApplicationLifecycleService,
};
pub use wizard::{
    ApplicationGateway, GatewayError, LocalApplicationGateway, SaveStatus, WizardController, WizardError,
    WizardSettings,
};
