// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Intake Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing one
// intake service deployment:
// - HTTP server binding and CORS
// - Database connection (absent => in-memory store)
// - Token signing and lifetime
// - Lifecycle and wizard tuning
// - Demo seeding and observability

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "udmt.io/v1";
pub const KIND: &str = "IntakeConfig";

/// Development signing secret; `validate` accepts it but startup warns.
pub const DEV_JWT_SECRET: &str = "udmt-dev-secret-key-change-in-production";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfigManifest {
    /// API version (must be "udmt.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "IntakeConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: IntakeConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub wizard: WizardConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin; "*" allows any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Maximum JSON body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. Unset => in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Session token lifetime (7 days by default)
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Refuse `submit` while any wizard step is incomplete. Off by default:
    /// the wizard gates its own submit button.
    #[serde(default)]
    pub enforce_step_completion: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Create the demo admin/applicant accounts on an empty user table
    #[serde(default = "default_true")]
    pub demo_users: bool,

    /// Create five sample applications owned by the demo applicants when
    /// no application exists yet
    #[serde(default)]
    pub sample_applications: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Prometheus exporter port; unset disables the exporter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_max_connections() -> u32 {
    5
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> u32 {
    24 * 7
}

fn default_autosave_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: default_autosave_delay_ms(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            demo_users: true,
            sample_applications: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_port: None,
        }
    }
}

impl Default for IntakeConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "udmt-intake".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: IntakeConfigSpec::default(),
        }
    }
}

impl IntakeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate locations, in precedence order:
    /// 1. UDMT_CONFIG_PATH environment variable
    /// 2. ./udmt-config.yaml
    /// 3. ~/.udmt/config.yaml
    /// 4. /etc/udmt/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("UDMT_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./udmt-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".udmt").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/udmt/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Container deployments override the file through environment
    /// variables.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("UDMT_DATABASE_URL") {
            tracing::info!("Environment override: UDMT_DATABASE_URL");
            self.spec.database.url = Some(url);
        }

        if let Ok(secret) = std::env::var("UDMT_JWT_SECRET") {
            tracing::info!("Environment override: UDMT_JWT_SECRET");
            self.spec.auth.jwt_secret = secret;
        }

        if let Ok(origin) = std::env::var("UDMT_CORS_ORIGIN") {
            tracing::info!("Environment override: UDMT_CORS_ORIGIN={}", origin);
            self.spec.server.cors_origin = origin;
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for PORT: '{}'. Ignoring.", port);
                }
            }
        }

        if let Ok(val) = std::env::var("UDMT_ENFORCE_STEP_COMPLETION") {
            match parse_flag(&val) {
                Some(flag) => {
                    tracing::info!("Environment override: UDMT_ENFORCE_STEP_COMPLETION={}", flag);
                    self.spec.lifecycle.enforce_step_completion = flag;
                }
                None => {
                    tracing::warn!(
                        "Invalid value for UDMT_ENFORCE_STEP_COMPLETION: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("UDMT_SEED_SAMPLE_APPLICATIONS") {
            match parse_flag(&val) {
                Some(flag) => {
                    tracing::info!("Environment override: UDMT_SEED_SAMPLE_APPLICATIONS={}", flag);
                    self.spec.seed.sample_applications = flag;
                }
                None => {
                    tracing::warn!(
                        "Invalid value for UDMT_SEED_SAMPLE_APPLICATIONS: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port must be non-zero");
        }

        if self.spec.auth.jwt_secret.is_empty() {
            anyhow::bail!("spec.auth.jwt_secret cannot be empty");
        }

        if self.spec.auth.token_ttl_hours == 0 {
            anyhow::bail!("spec.auth.token_ttl_hours must be at least 1");
        }

        if self.spec.wizard.autosave_delay_ms == 0 {
            anyhow::bail!("spec.wizard.autosave_delay_ms must be non-zero");
        }

        if let Some(url) = &self.spec.database.url {
            if url.is_empty() {
                anyhow::bail!("spec.database.url cannot be empty when set");
            }
            if self.spec.database.max_connections == 0 {
                anyhow::bail!("spec.database.max_connections must be at least 1");
            }
        }

        match self.spec.observability.log_format.as_str() {
            "compact" | "json" => {}
            other => anyhow::bail!("Invalid log_format: '{}'. Expected 'compact' or 'json'", other),
        }

        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.spec.auth.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
