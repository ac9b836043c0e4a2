//! Console configuration.
//!
//! A YAML file holds named server profiles, the active profile name, and
//! shell preferences. Default location: `~/.luxlink/config.yaml`. The
//! `LUXLINK_API_KEY` environment variable overrides the configured API key
//! for whichever profile is active.

#![forbid(unsafe_code)]

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides the active profile's API key.
pub const API_KEY_ENV: &str = "LUXLINK_API_KEY";

/// Directory name under the home directory.
const CONFIG_DIR: &str = ".luxlink";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File read/write failure.
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed YAML.
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One named bridge server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Display name.
    pub name: String,
    /// Base HTTP URL.
    pub url: String,
    /// Optional API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Shell UI preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellPreferences {
    /// Command history entries kept.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Watch-mode refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub auto_refresh_interval: f64,
    /// Preferred output format for one-shot commands.
    #[serde(default = "default_output_format")]
    pub default_output_format: String,
}

fn default_history_size() -> usize {
    1000
}

fn default_refresh_interval() -> f64 {
    5.0
}

fn default_output_format() -> String {
    "table".to_string()
}

impl Default for ShellPreferences {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            auto_refresh_interval: default_refresh_interval(),
            default_output_format: default_output_format(),
        }
    }
}

/// Top-level console configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Profiles keyed by short name.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerProfile>,
    /// Key of the active profile.
    #[serde(default = "default_active")]
    pub active_server: String,
    /// Shell preferences.
    #[serde(default)]
    pub shell: ShellPreferences,
}

fn default_active() -> String {
    "default".to_string()
}

impl ConsoleConfig {
    /// Default configuration: one local profile.
    pub fn create_default() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(
            "default".to_string(),
            ServerProfile {
                name: "Local Bridge".to_string(),
                url: "http://127.0.0.1:8000".to_string(),
                api_key: None,
            },
        );
        Self { servers, active_server: default_active(), shell: ShellPreferences::default() }
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::create_default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// The active server profile, if the active key resolves.
    pub fn active_profile(&self) -> Option<&ServerProfile> {
        self.servers.get(&self.active_server)
    }

    /// API key for `server_name`, with the environment variable taking
    /// precedence over the configured key.
    pub fn api_key_for(&self, server_name: &str) -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            return Some(key);
        }
        self.servers.get(server_name).and_then(|s| s.api_key.clone())
    }
}

/// Default config file path (`~/.luxlink/config.yaml`).
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Default history file path (`~/.luxlink/history`).
pub fn default_history_path() -> PathBuf {
    config_dir().join("history")
}

/// Default log file path (`~/.luxlink/console.log`).
pub fn default_log_path() -> PathBuf {
    config_dir().join("console.log")
}

fn config_dir() -> PathBuf {
    std::env::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(CONFIG_DIR)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_local_profile() {
        let config = ConsoleConfig::create_default();
        let profile = config.active_profile().unwrap();
        assert_eq!(profile.url, "http://127.0.0.1:8000");
        assert!(profile.api_key.is_none());
    }

    #[test]
    fn round_trips_through_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = ConsoleConfig::create_default();
        config.servers.insert(
            "stage".to_string(),
            ServerProfile {
                name: "Stage".to_string(),
                url: "http://10.0.0.5:8000".to_string(),
                api_key: Some("k".to_string()),
            },
        );
        config.active_server = "stage".to_string();
        config.shell.history_size = 50;
        config.save(&path).unwrap();

        let loaded = ConsoleConfig::load(&path).unwrap();
        assert_eq!(loaded.active_server, "stage");
        assert_eq!(loaded.servers.len(), 2);
        assert_eq!(loaded.shell.history_size, 50);
        assert_eq!(loaded.active_profile().unwrap().api_key.as_deref(), Some("k"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert!(config.servers.contains_key("default"));
    }

    #[test]
    fn configured_key_used_when_env_unset() {
        let mut config = ConsoleConfig::create_default();
        config.servers.get_mut("default").unwrap().api_key = Some("from-config".to_string());
        // Serial: relies on LUXLINK_API_KEY being unset in the test env.
        if std::env::var(API_KEY_ENV).is_err() {
            assert_eq!(config.api_key_for("default").as_deref(), Some("from-config"));
        }
    }
}
