//! Configuration management for tally.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "tally";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "tally.db";

/// Default log file name.
const LOG_FILE_NAME: &str = "tally.log";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TALLY_`, sections split on `__`)
/// 2. TOML config file at `~/.config/tally/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Screen configuration.
    pub ui: UiConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/tally/tally.db`
    pub database_path: Option<PathBuf>,
}

/// Screen-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long the last-updated notification stays visible, in milliseconds.
    pub notification_ms: u64,
    /// Input poll interval in milliseconds.
    pub tick_ms: u64,
}

/// Logging-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// File that receives log output while the screen is active.
    /// Defaults to `~/.local/share/tally/tally.log`
    pub file: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notification_ms: 3500,
            tick_ms: 250,
        }
    }
}

impl Config {
    /// Load configuration from all sources, reading the TOML file at
    /// `config_path` or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("TALLY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.ui.notification_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "notification_ms must be greater than 0".to_string(),
            });
        }

        if self.ui.tick_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "tick_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the log file path, resolving defaults if not set.
    #[must_use]
    pub fn log_file_path(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LOG_FILE_NAME))
    }

    /// Get the notification lifetime as a Duration.
    #[must_use]
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.ui.notification_ms)
    }

    /// Get the input poll interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.ui.tick_ms)
    }
}
