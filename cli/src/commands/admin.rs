// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use udmt_core::domain::application::ApplicationStatus;

use crate::client::IntakeClient;
use crate::commands::app::status_label;

#[derive(Subcommand)]
pub enum AdminCommand {
    /// List every application
    List {
        /// Only show applications in this status (draft or submitted)
        #[arg(long, value_parser = parse_status)]
        status: Option<ApplicationStatus>,
    },
}

fn parse_status(value: &str) -> Result<ApplicationStatus, String> {
    value.parse().map_err(|e: udmt_core::domain::application::ApplicationError| e.to_string())
}

pub async fn handle_command(command: AdminCommand, client: IntakeClient) -> Result<()> {
    match command {
        AdminCommand::List { status } => list(&client, status).await,
    }
}

async fn list(client: &IntakeClient, status: Option<ApplicationStatus>) -> Result<()> {
    let applications = client.list_all(status).await?;

    if applications.is_empty() {
        println!("{}", "No applications found".yellow());
        return Ok(());
    }

    println!("{} applications:", applications.len());
    println!("{:<6} {:<11} {:<30} {:<28} {}", "ID", "STATUS", "PROJECT", "OWNER", "SUBMITTED");
    for entry in &applications {
        let application = &entry.application;
        println!(
            "{:<6} {:<11} {:<30} {:<28} {}",
            application.id,
            status_label(application.status),
            application.form_data.project_name().unwrap_or("(untitled)"),
            entry.owner.email,
            application
                .submitted_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("submitted"), Ok(ApplicationStatus::Submitted));
        assert!(parse_status("archived").is_err());
    }
}
