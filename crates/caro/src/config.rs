//! Client configuration.

use caro_engine::{ConfigError, RulesConfig};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "caro.toml";

/// Settings for one console client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name shown to the player and in logs.
    #[serde(default = "default_nickname")]
    nickname: String,

    /// Where tracing output goes; stdout belongs to the board.
    #[serde(default = "default_log_file")]
    log_file: PathBuf,

    /// Game rules. Both peers must use the same values.
    #[serde(default)]
    rules: RulesConfig,
}

fn default_nickname() -> String {
    "player".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("caro.log")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nickname: default_nickname(),
            log_file: default_log_file(),
            rules: RulesConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file and validates its rules.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.rules.validate()?;

        info!(nickname = %config.nickname, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the explicit path if given, else `caro.toml` if present,
    /// else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}
