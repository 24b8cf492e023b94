//! Server configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `OTECH__SECTION__KEY` environment variables. The Gemini key
//! additionally falls back to the conventional `GEMINI_API_KEY` variable.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::csv_data::RowPolicy;

pub const APP_NAME: &str = "otech";

/// Conventional environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub attachments: AttachmentConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body size in megabytes (attachments travel inline).
    pub max_body_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_mb: 10,
        }
    }
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Missing keys do not stop the server; every generation fails instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// CSV attachment handling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    pub row_policy: RowPolicy,
}

impl AppConfig {
    /// Load configuration from `path` (or the default location) plus the
    /// environment. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_file = match path {
            Some(path) => expand_path(path)?,
            None => default_config_file()?,
        };

        let built = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .add_source(
                File::from(config_file.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(&env_prefix()).separator("__"))
            .build()
            .with_context(|| format!("loading configuration from {}", config_file.display()))?;

        let mut config: AppConfig = built
            .try_deserialize()
            .context("parsing configuration")?;
        config.apply_key_fallback(env::var(GEMINI_API_KEY_ENV).ok());
        Ok(config)
    }

    /// Use `fallback` as the Gemini key when none is configured. Blank
    /// values count as missing.
    pub fn apply_key_fallback(&mut self, fallback: Option<String>) {
        let configured = self
            .gemini
            .api_key
            .take()
            .filter(|key| !key.trim().is_empty());
        self.gemini.api_key = configured.or(fallback.filter(|key| !key.trim().is_empty()));
    }

    /// TOML rendering with the API key masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.gemini.api_key.is_some() {
            redacted.gemini.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&redacted).context("serializing configuration to TOML")
    }
}

pub fn default_config_file() -> Result<PathBuf> {
    Ok(default_config_dir()?.join("config.toml"))
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(dir) = dirs::config_dir() {
        return Ok(dir.join(APP_NAME));
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let Some(text) = path.to_str() else {
        return Ok(path.to_path_buf());
    };
    let expanded = shellexpand::full(text).context("expanding path")?;
    let expanded = PathBuf::from(expanded.to_string());
    if expanded.is_dir() {
        Ok(expanded.join("config.toml"))
    } else {
        Ok(expanded)
    }
}

fn env_prefix() -> String {
    APP_NAME.to_ascii_uppercase()
}
