// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # UDMT Intake CLI
//!
//! The `udmt` binary runs the intake portal API and doubles as a client for
//! a running server.
//!
//! ## Commands
//!
//! - `udmt serve` - Run the HTTP API
//! - `udmt config show|validate|generate` - Configuration management
//! - `udmt login` - Authenticate and save a session
//! - `udmt app list|show|create|submit|delete` - Applicant operations
//! - `udmt admin list` - Reviewer listing across all applicants
//! - `udmt wizard fill` - Fill in and optionally submit an application

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use tracing::info;

use udmt_core::application::WizardSettings;
use udmt_core::domain::config::IntakeConfigManifest;
use udmt_intake::commands::{self, AdminCommand, AppCommand, ConfigCommand, FillArgs};
use udmt_intake::server;
use udmt_intake::session::authenticated_client;

/// UDMT Intake - measurement-device application portal
#[derive(Parser)]
#[command(name = "udmt")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "UDMT_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of a running intake server
    #[arg(long, global = true, env = "UDMT_SERVER", default_value = "http://localhost:3001")]
    server: String,

    /// Bearer token (default: saved session from `udmt login`)
    #[arg(long, global = true, env = "UDMT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "UDMT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Log in and save the session token
    #[command(name = "login")]
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "UDMT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Your applications
    #[command(name = "app")]
    App {
        #[command(subcommand)]
        command: AppCommand,
    },

    /// Reviewer operations (admin role)
    #[command(name = "admin")]
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Drive the application wizard
    #[command(name = "wizard")]
    Wizard {
        #[command(subcommand)]
        command: WizardCommand,
    },
}

#[derive(Subcommand)]
enum WizardCommand {
    /// Fill in an application from a JSON answers file
    Fill(FillArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => {
            let config = IntakeConfigManifest::load_or_default(cli.config).context("Failed to load configuration")?;
            let observability = &config.spec.observability;
            let level = cli.log_level.as_deref().unwrap_or(&observability.log_level);
            init_logging(level, &observability.log_format)?;

            if let Some(port) = observability.metrics_port {
                install_metrics_exporter(port)?;
            }

            info!(name = %config.metadata.name, "Starting UDMT intake server");
            server::run(config).await
        }
        Some(Commands::Config { command }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Login { email, password }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
            commands::auth::login(&cli.server, &email, &password).await
        }
        Some(Commands::App { command }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
            let client = authenticated_client(&cli.server, cli.token)?;
            commands::app::handle_command(command, client).await
        }
        Some(Commands::Admin { command }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
            let client = authenticated_client(&cli.server, cli.token)?;
            commands::admin::handle_command(command, client).await
        }
        Some(Commands::Wizard {
            command: WizardCommand::Fill(args),
        }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
            let config = IntakeConfigManifest::load_or_default(cli.config).context("Failed to load configuration")?;
            let settings = WizardSettings::from(&config.spec.wizard);
            let client = authenticated_client(&cli.server, cli.token)?;
            commands::wizard::fill(args, client, settings).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().with_target(true).init(),
        _ => builder.with_target(false).compact().init(),
    }

    Ok(())
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!(port, "Prometheus metrics exporter listening");
    Ok(())
}
