//! Configuration management for Crosspost

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub posting: PostingConfig,
    pub weasyl: Option<WeasylConfig>,
}

/// Global posting settings.
///
/// Posting tasks receive this as a read-only snapshot at construction; they
/// never reach back into a live settings store mid-attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    /// Append the promotional line to descriptions on destinations that
    /// allow it.
    #[serde(default = "default_advertise")]
    pub advertise: bool,
    /// Buffer capacity of the poster event bus, per subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_advertise() -> bool {
    true
}

fn default_event_capacity() -> usize {
    100
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            advertise: true,
            event_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeasylConfig {
    pub enabled: bool,
    pub api_key_file: String,
    /// Override for tests and staging instances.
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            posting: PostingConfig::default(),
            weasyl: Some(WeasylConfig {
                enabled: false,
                api_key_file: "~/.config/crosspost/weasyl.key".to_string(),
                base_url: None,
            }),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CROSSPOST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("crosspost").join("config.toml"))
}
