//! Configuration loading for identity-mcp
//!
//! Configuration is resolved from, highest priority first:
//! 1. Command-line flags
//! 2. Environment variables (`IDENTITY_*`)
//! 3. The TOML file named by `--config` / `IDENTITY_MCP_CONFIG`, or
//!    `~/.binks/identity.toml`
//! 4. Default values
//!
//! Credentials are only ever read from flags or the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::credits::DEFAULT_ALERT_THRESHOLD;

/// Command-line interface
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "identity-mcp", version, about = "MCP server for crypto address and social handle identity lookups")]
pub struct Cli {
    /// Base URL of the identity API
    #[arg(long, env = "IDENTITY_API_URL")]
    pub api_url: Option<String>,

    /// API key for credit-based access
    #[arg(long, env = "IDENTITY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Hex private key for x402 pay-per-call access on Base
    #[arg(long, env = "IDENTITY_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Low-credit alert threshold
    #[arg(long, env = "IDENTITY_CREDIT_ALERT")]
    pub alert_threshold: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "IDENTITY_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long, env = "IDENTITY_MCP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Credit alert configuration
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Credit alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsConfig {
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u64,
}

/// Raw credential values; resolved into an `AuthContext` at startup
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub private_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_api_url() -> String {
    "http://localhost:8787".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_alert_threshold() -> u64 {
    DEFAULT_ALERT_THRESHOLD
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            alert_threshold: default_alert_threshold(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load configuration from file, then apply flags and environment
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match Self::find_config_path(cli) {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(&path)?
            }
            Some(path) if cli.config.is_some() => {
                anyhow::bail!("config file not found: {}", path.display())
            }
            _ => {
                tracing::debug!("No config file, using defaults");
                Self::default()
            }
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.timeout_seconds == 0 {
            anyhow::bail!("request timeout must be at least 1 second");
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref url) = cli.api_url {
            self.api.url = url.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            self.api.timeout_seconds = secs;
        }
        if let Some(threshold) = cli.alert_threshold {
            self.credits.alert_threshold = threshold;
        }
        self.credentials = Credentials {
            api_key: cli.api_key.clone(),
            private_key: cli.private_key.clone(),
        };
    }

    /// Find the configuration file path
    fn find_config_path(cli: &Cli) -> Option<PathBuf> {
        if let Some(ref path) = cli.config {
            return Some(path.clone());
        }

        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".binks").join("identity.toml"))
    }
}
