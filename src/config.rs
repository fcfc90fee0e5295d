use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::truncate::{TruncationStrategy, MIN_MAX_LENGTH};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_result_window")]
    pub result_window: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            language: default_language(),
            result_window: default_result_window(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://help.sap.com".to_string()
}
fn default_user_agent() -> String {
    format!("sap-help-mcp/{}", env!("CARGO_PKG_VERSION"))
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_result_window() -> u32 {
    20
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub strategy: TruncationStrategy,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            strategy: TruncationStrategy::default(),
        }
    }
}

fn default_max_length() -> usize {
    75_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7337".to_string()
}

impl Config {
    /// All defaults, used when no config file exists at the default path.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Apply `SAP_HELP_*` environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base_url) = lookup("SAP_HELP_BASE_URL") {
            self.portal.base_url = base_url;
        }
        if let Some(max_length) = lookup("SAP_HELP_MAX_CONTENT_LENGTH") {
            self.content.max_length = max_length
                .trim()
                .parse()
                .with_context(|| format!("SAP_HELP_MAX_CONTENT_LENGTH is not a number: {}", max_length))?;
        }
        if let Some(bind) = lookup("SAP_HELP_BIND") {
            self.server.bind = bind;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.content.max_length < MIN_MAX_LENGTH {
            anyhow::bail!("content.max_length must be at least {}", MIN_MAX_LENGTH);
        }

        if !(1..=100).contains(&self.portal.result_window) {
            anyhow::bail!("portal.result_window must be in [1, 100]");
        }

        let base = url::Url::parse(&self.portal.base_url)
            .with_context(|| format!("portal.base_url is not a valid URL: {}", self.portal.base_url))?;
        match base.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!(
                "portal.base_url must use http or https, got '{}'",
                other
            ),
        }

        Ok(())
    }
}

/// Load the config file at `path`.
///
/// When `required` is false a missing file yields [`Config::minimal`]; an
/// explicitly passed path must exist.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    let mut config = if path.exists() || required {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::minimal()
    };

    config.apply_env_overrides()?;
    config.validate()?;

    Ok(config)
}
