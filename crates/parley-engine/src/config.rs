//! Configuration for parley.
//!
//! Settings live in `<data_dir>/config.json`. Every field has a default, so a
//! missing or partial file still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::STORAGE_KEY;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "PARLEY_HOME";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Chat endpoint accepting `{"message": ...}` and answering `{"reply": ...}`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Delay between revealed characters of a fresh reply.
    #[serde(default = "default_typing_interval_ms")]
    pub typing_interval_ms: u64,

    /// Timeout for a single reply request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Color theme for the TUI.
    #[serde(default)]
    pub theme: ThemeChoice,

    /// Namespace key the conversations are stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_endpoint() -> String {
    "http://localhost:8000/api/chat".into()
}

fn default_typing_interval_ms() -> u64 {
    20
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_storage_key() -> String {
    STORAGE_KEY.into()
}

/// Color theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeChoice {
    #[default]
    Dark,
    Light,
    HighContrast,
}

impl ThemeChoice {
    /// The theme after this one when cycling.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::HighContrast,
            Self::HighContrast => Self::Dark,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, treating a missing file as defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            typing_interval_ms: default_typing_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            theme: ThemeChoice::default(),
            storage_key: default_storage_key(),
        }
    }
}

/// Resolve the data directory.
///
/// Order: explicit path, `PARLEY_HOME`, the platform data dir, then `.parley`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::data_dir().map_or_else(|| PathBuf::from(".parley"), |dir| dir.join("parley"))
}

/// Path of the config file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

/// Directory holding the conversation store inside a data directory.
pub fn store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("store")
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}
