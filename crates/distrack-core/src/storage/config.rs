//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Storage backend and document name
//! - Release feed for update checks
//! - Display defaults for the CLI
//!
//! Configuration is stored at `~/.config/distrack/config.toml`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use super::data_dir;
use super::DOCUMENT_NAME;
use crate::error::ConfigError;

/// Execution mode. Development never contacts the update server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Production,
    Development,
}

impl RunMode {
    /// `DISTRACK_ENV=dev` (or `development`) selects development mode.
    pub fn from_env() -> Self {
        match std::env::var("DISTRACK_ENV").as_deref() {
            Ok("dev") | Ok("development") => RunMode::Development,
            _ => RunMode::Production,
        }
    }

    pub fn is_dev(self) -> bool {
        self == RunMode::Development
    }
}

/// Where the challenge document is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Sqlite,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_document_name")]
    pub document_name: String,
}

/// Update check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// URL of the JSON release manifest. Empty disables checks.
    #[serde(default)]
    pub feed_url: String,
}

/// CLI display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_recent_logs")]
    pub recent_logs: u32,
    #[serde(default = "default_sport")]
    pub default_sport: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/distrack/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub updates: UpdatesConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

// Default functions
fn default_backend() -> StorageBackend {
    StorageBackend::Json
}
fn default_document_name() -> String {
    DOCUMENT_NAME.into()
}
fn default_true() -> bool {
    true
}
fn default_recent_logs() -> u32 {
    6
}
fn default_sport() -> String {
    "cycling".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            document_name: default_document_name(),
        }
    }
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: String::new(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            recent_logs: default_recent_logs(),
            default_sport: default_sport(),
        }
    }
}

/// `display.recent_logs` -> `/display/recent_logs`.
fn pointer(key: &str) -> Option<String> {
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return None;
    }
    Some(format!("/{}", key.replace('.', "/")))
}

/// Parse `raw` into the JSON type already stored at the target key.
fn coerce_like(existing: &Value, key: &str, raw: &str) -> Result<Value, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };
    match existing {
        Value::Bool(_) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| invalid(format!("expected true or false, got '{raw}'"))),
        Value::Number(_) => raw
            .parse::<u32>()
            .map(Value::from)
            .map_err(|_| invalid(format!("expected a non-negative integer, got '{raw}'"))),
        Value::String(_) => Ok(Value::String(raw.to_string())),
        Value::Object(_) | Value::Array(_) | Value::Null => {
            Err(invalid("not a single value; set one of its fields".into()))
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.pointer(&pointer(key)?)? {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the key's type (including unknown enum variants such as a
    /// storage backend that does not exist).
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let path = pointer(key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let slot = json
            .pointer_mut(&path)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *slot = coerce_like(&*slot, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
