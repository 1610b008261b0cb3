// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use colored::Colorize;

use crate::client::IntakeClient;
use crate::session::Session;

pub async fn login(server: &str, email: &str, password: &str) -> Result<()> {
    let client = IntakeClient::new(server)?;
    let response = client
        .login(email, password)
        .await
        .with_context(|| format!("Login to {} failed", server))?;

    let session = Session {
        server: server.to_string(),
        email: response.user.email.clone(),
        token: response.token,
    };
    let path = session.save()?;

    println!(
        "{}",
        format!("✓ Logged in as {} ({})", response.user.name, response.user.role).green()
    );
    println!("{}", format!("Session saved to {}", path.display()).dimmed());
    Ok(())
}
