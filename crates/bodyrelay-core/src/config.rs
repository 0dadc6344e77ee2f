use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default chunk size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Client identifier sent as `User-Agent` on every chunk POST.
pub const DEFAULT_CLIENT_ID: &str = "shadowrocket-upload";

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Multipart submission settings (optional `[submit]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Local API endpoint accepting `{file, filetype, region}` forms.
    pub endpoint: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/api/upload".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/bodyrelay/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Collection endpoint every chunk is POSTed to.
    pub upload_url: String,
    /// Value of the `User-Agent` header on chunk POSTs.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Attempts per chunk (including the first) before the relay aborts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Connect timeout for each chunk POST.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for each chunk POST.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional form submission settings; built-in defaults when missing.
    #[serde(default)]
    pub submit: Option<SubmitConfig>,
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_attempts() -> u32 {
    3
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upload_url: "http://127.0.0.1:8849/upload".to_string(),
            client_id: default_client_id(),
            chunk_size: default_chunk_size(),
            max_attempts: default_max_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            submit: None,
        }
    }
}

impl RelayConfig {
    /// Checks values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        check_http_url("upload_url", &self.upload_url)?;
        if let Some(submit) = &self.submit {
            check_http_url("submit.endpoint", &submit.endpoint)?;
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Submission settings, falling back to defaults.
    pub fn submit_or_default(&self) -> SubmitConfig {
        self.submit.clone().unwrap_or_default()
    }
}

fn check_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };
    let parsed = url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bodyrelay")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RelayConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RelayConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<RelayConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: RelayConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
