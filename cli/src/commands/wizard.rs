// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `udmt wizard fill`: runs a wizard session against the server with answers
//! from a JSON file, reports per-step completion and optionally submits.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use udmt_core::application::{WizardController, WizardError, WizardSettings};
use udmt_core::domain::application::ApplicationId;
use udmt_core::domain::wizard::{StepCompletion, WizardStep};

use crate::client::IntakeClient;
use crate::commands::app::read_form_file;

#[derive(Args)]
pub struct FillArgs {
    /// JSON file with form answers (merged over any existing answers)
    #[arg(value_name = "ANSWERS")]
    pub answers: PathBuf,

    /// Continue an existing draft instead of creating a new one
    #[arg(long, value_name = "ID")]
    pub id: Option<i64>,

    /// Submit once every step is complete
    #[arg(long)]
    pub submit: bool,
}

pub async fn fill(args: FillArgs, client: IntakeClient, settings: WizardSettings) -> Result<()> {
    let answers = read_form_file(&args.answers)?;
    let gateway = Arc::new(client.clone());

    let mut wizard = match args.id {
        Some(id) => {
            let existing = client
                .get(ApplicationId(id))
                .await
                .with_context(|| format!("Failed to load application {}", id))?;
            WizardController::resume(gateway, settings, &existing.application)
        }
        None => WizardController::new(gateway, settings),
    };

    match wizard.update_form_data(answers) {
        Err(WizardError::ReadOnly) => anyhow::bail!("Application is already submitted and cannot be edited"),
        other => other?,
    }

    let saved = wizard.save().await.context("Failed to save answers")?;
    println!("{}", format!("✓ Answers saved to application {}", saved.id).green());
    print_completion(&wizard.completion());

    if !args.submit {
        return Ok(());
    }

    match wizard.submit().await {
        Ok(application) => {
            println!("{}", format!("✓ Application {} submitted", application.id).green());
            Ok(())
        }
        Err(WizardError::Incomplete(steps)) => {
            let names: Vec<&str> = steps.iter().map(|s| s.display_name()).collect();
            anyhow::bail!("Cannot submit, incomplete steps: {}", names.join(", "))
        }
        Err(err) => Err(err).context("Submit failed"),
    }
}

fn print_completion(completion: &StepCompletion) {
    for step in WizardStep::ALL {
        let mark = if completion.is_complete(step) {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {} {}", mark, step);
    }
}
