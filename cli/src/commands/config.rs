// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use udmt_core::domain::config::IntakeConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with every default spelled out
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./udmt-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = IntakeConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;
    let spec = &config.spec;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. UDMT_CONFIG_PATH: {}",
            std::env::var("UDMT_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./udmt-config.yaml");
        println!("  4. ~/.udmt/config.yaml");
        println!("  5. /etc/udmt/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!("  CORS origin: {}", spec.server.cors_origin);
    println!("  Body limit: {} bytes", spec.server.body_limit_bytes);
    println!();

    println!("{}", "Storage:".bold());
    match &spec.database.url {
        Some(_) => println!(
            "  PostgreSQL (max {} connections, migrations {})",
            spec.database.max_connections,
            if spec.database.run_migrations { "on" } else { "off" }
        ),
        None => println!("  {}", "in-memory (no database URL)".yellow()),
    }
    println!();

    println!("{}", "Auth:".bold());
    if config.uses_dev_secret() {
        println!("  JWT secret: {}", "development default".yellow());
    } else {
        println!("  JWT secret: {}", "(configured)".dimmed());
    }
    println!("  Token lifetime: {}h", spec.auth.token_ttl_hours);
    println!("  Demo accounts: {}", spec.seed.demo_users);
    println!("  Sample applications: {}", spec.seed.sample_applications);
    println!();

    println!("{}", "Lifecycle:".bold());
    println!("  Enforce step completion: {}", spec.lifecycle.enforce_step_completion);
    println!("  Wizard autosave delay: {}ms", spec.wizard.autosave_delay_ms);
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = IntakeConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    if config.uses_dev_secret() {
        println!("{}", "⚠ Using the development JWT secret".yellow());
    }

    Ok(())
}

fn generate(output: PathBuf) -> Result<()> {
    if output.exists() {
        anyhow::bail!("Refusing to overwrite existing file {}", output.display());
    }

    IntakeConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());
    Ok(())
}
