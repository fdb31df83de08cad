//! TOML-based application configuration.
//!
//! Stores settings that are not per-session state:
//! - The fallback session length for first runs
//! - The bell recording and its fallback duration
//! - The maximum accepted recording length at catalog ingest
//!
//! Configuration is stored at `~/.config/tempora/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes used when no session length has been stored yet.
    #[serde(default = "default_session_min")]
    pub default_length_min: u64,
}

/// Audio settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Local bell recording played at both ends of a session.
    #[serde(default)]
    pub bell_path: Option<String>,
    /// Bell length assumed when the file is absent or unreadable.
    #[serde(default = "default_bell_secs")]
    pub bell_secs: u64,
    /// Longest accepted meditation recording.
    #[serde(default = "default_max_track_secs")]
    pub max_track_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tempora/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

fn default_session_min() -> u64 {
    20
}
fn default_bell_secs() -> u64 {
    3
}
fn default_max_track_secs() -> u64 {
    90
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_length_min: default_session_min(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bell_path: None,
            bell_secs: default_bell_secs(),
            max_track_secs: default_max_track_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::DataDir(e.to_string()))?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing defaults on a first run.
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

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
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
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(match current {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => return None,
            other => other.to_string(),
        })
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "session.default_length_min" => {
                self.session.default_length_min = parse_u64(key, value)?;
            }
            "audio.bell_path" => {
                self.audio.bell_path = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "audio.bell_secs" => self.audio.bell_secs = parse_u64(key, value)?,
            "audio.max_track_secs" => self.audio.max_track_secs = parse_u64(key, value)?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.save()?;
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("cannot parse '{value}' as a number"),
    })
}
