//! Configuration loading and backend base URL resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Compiled default for the backend base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL
pub const BASE_URL_ENV: &str = "TAGDESK_BASE_URL";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MIN_BUSY_MS: u64 = 2000;
const DEFAULT_EVENT_CAPACITY: usize = 100;

/// How the upload workflow reports its busy phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyDisplay {
    /// Uploading while files are sent, then Analyzing while results are refreshed
    #[default]
    Split,
    /// A single Processing phase for the whole batch
    Unified,
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "tagdesk_client=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// On-disk configuration (`config.toml`)
///
/// Every field is optional; missing values fall back to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub min_busy_ms: Option<u64>,
    pub busy_display: Option<BusyDisplay>,
    pub event_capacity: Option<usize>,
    pub logging: LoggingConfig,
}

/// Resolved configuration handed to the client engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash
    pub base_url: String,
    pub request_timeout: Duration,
    /// Minimum time the upload workflow stays busy, zero disables it
    pub min_busy: Duration,
    pub busy_display: BusyDisplay,
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            min_busy: Duration::from_millis(DEFAULT_MIN_BUSY_MS),
            busy_display: BusyDisplay::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Resolve the client configuration.
    ///
    /// Base URL priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable `TAGDESK_BASE_URL`
    /// 3. TOML config file
    /// 4. Compiled default (fallback)
    pub fn resolve(cli_base_url: Option<&str>, toml_config: &TomlConfig) -> Result<Self> {
        let env_base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let (raw, source) = if let Some(url) = cli_base_url {
            (url.to_string(), "command line")
        } else if let Some(url) = env_base_url {
            (url, "environment")
        } else if let Some(url) = &toml_config.base_url {
            (url.clone(), "TOML config")
        } else {
            (DEFAULT_BASE_URL.to_string(), "compiled default")
        };

        let base_url = normalize_base_url(&raw)?;
        info!(base_url = %base_url, source, "Resolved backend base URL");

        let event_capacity = toml_config.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(
                toml_config
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            min_busy: Duration::from_millis(toml_config.min_busy_ms.unwrap_or(DEFAULT_MIN_BUSY_MS)),
            busy_display: toml_config.busy_display.unwrap_or_default(),
            event_capacity,
        })
    }
}

/// Validate a base URL and strip trailing slashes
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            Error::Config(format!("Base URL must start with http:// or https://: {:?}", raw))
        })?;
    if host.is_empty() {
        return Err(Error::Config(format!("Base URL has no host: {:?}", raw)));
    }
    Ok(trimmed.to_string())
}

/// Load the TOML configuration.
///
/// An explicit path must exist. Without one, the platform default location is
/// tried and a missing file yields defaults with a warning.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    debug!(path = %path.display(), "Loading config file");
    let content = std::fs::read_to_string(&path)?;
    parse_toml_config(&content)
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Default configuration file path for the platform, if one exists
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("tagdesk").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/tagdesk/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
