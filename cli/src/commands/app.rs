// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application commands for applicants
//!
//! Commands: list, show, create, submit, delete

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use udmt_core::domain::application::{Application, ApplicationId, ApplicationStatus};
use udmt_core::domain::form_data::FormData;
use udmt_core::domain::wizard::StepCompletion;

use crate::client::IntakeClient;

#[derive(Subcommand)]
pub enum AppCommand {
    /// List your applications
    List,

    /// Show one application as JSON
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Create a draft application
    Create {
        /// JSON file with initial form answers
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Submit an application for review
    Submit {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Delete an application
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
}

pub async fn handle_command(command: AppCommand, client: IntakeClient) -> Result<()> {
    match command {
        AppCommand::List => list(&client).await,
        AppCommand::Show { id } => show(&client, ApplicationId(id)).await,
        AppCommand::Create { file } => create(&client, file.as_deref()).await,
        AppCommand::Submit { id } => submit(&client, ApplicationId(id)).await,
        AppCommand::Delete { id } => delete(&client, ApplicationId(id)).await,
    }
}

/// Reads a JSON object of form answers.
pub fn read_form_file(path: &Path) -> Result<FormData> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{:?} is not valid JSON", path))?;
    FormData::from_value(value).with_context(|| format!("Invalid form data in {:?}", path))
}

pub fn status_label(status: ApplicationStatus) -> colored::ColoredString {
    match status {
        ApplicationStatus::Draft => "draft".yellow(),
        ApplicationStatus::Submitted => "submitted".green(),
    }
}

pub fn print_row(application: &Application) {
    let completion = StepCompletion::evaluate(&application.form_data);
    let done = completion.as_slice().iter().filter(|c| **c).count();
    println!(
        "{:<6} {:<11} {:<36} {:<6} {}",
        application.id,
        status_label(application.status),
        application.form_data.project_name().unwrap_or("(untitled)"),
        format!("{}/8", done),
        application.updated_at.format("%Y-%m-%d %H:%M"),
    );
}

async fn list(client: &IntakeClient) -> Result<()> {
    let applications = client.list_own().await?;

    if applications.is_empty() {
        println!("{}", "No applications found".yellow());
        return Ok(());
    }

    println!("{:<6} {:<11} {:<36} {:<6} {}", "ID", "STATUS", "PROJECT", "STEPS", "UPDATED");
    for application in &applications {
        print_row(application);
    }
    Ok(())
}

async fn show(client: &IntakeClient, id: ApplicationId) -> Result<()> {
    let application = client.get(id).await?;
    println!("{}", serde_json::to_string_pretty(&application)?);
    Ok(())
}

async fn create(client: &IntakeClient, file: Option<&Path>) -> Result<()> {
    let form_data = match file {
        Some(path) => read_form_file(path)?,
        None => FormData::new(),
    };

    let application = client.create(form_data).await?;
    println!("{}", format!("✓ Draft application {} created", application.id).green());
    Ok(())
}

async fn submit(client: &IntakeClient, id: ApplicationId) -> Result<()> {
    let application = client.submit(id).await?;
    let submitted_at = application
        .submitted_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    println!(
        "{}",
        format!("✓ Application {} submitted at {}", application.id, submitted_at).green()
    );
    Ok(())
}

async fn delete(client: &IntakeClient, id: ApplicationId) -> Result<()> {
    client.delete(id).await?;
    println!("{}", format!("✓ Application {} deleted", id).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_form_file_accepts_objects_only() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("answers.json");
        std::fs::write(&good, r#"{"projectName": "Green River"}"#).unwrap();
        assert_eq!(read_form_file(&good).unwrap().project_name(), Some("Green River"));

        let bad = dir.path().join("list.json");
        std::fs::write(&bad, "[1, 2]").unwrap();
        assert!(read_form_file(&bad).is_err());
    }
}
