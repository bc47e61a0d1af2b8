//! TOML-based application configuration.
//!
//! Stores persistence preferences: which store backend to use, the remote
//! endpoint, and the debounce window for coalesced session writes.
//! Configuration lives at `~/.config/rangeday/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pending::DEFAULT_DEBOUNCE_MS;
use crate::store::data_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local SQLite database.
    #[default]
    Local,
    /// Remote REST endpoint (requires `api_base_url`).
    Remote,
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Base URL of the remote endpoint, used by the remote backend.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Debounce window (milliseconds) for coalesced session writes.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: i64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            api_base_url: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> i64 {
    DEFAULT_DEBOUNCE_MS
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/rangeday/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    pub fn path() -> std::io::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration; a missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Config::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/rangeday/config.toml"),
            message: e.to_string(),
        })?;
        Self::load_from(path)
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Config::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("~/.config/rangeday/config.toml"),
            message: e.to_string(),
        })?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}
