//! CI Configuration
//!
//! Settings read from `config.toml`:
//! - logging level
//! - Android provisioning (per-user config dir, sdkmanager prompt handling)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CiError, Result};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Android SDK provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AndroidConfig {
    /// Per-user Android directory holding `repositories.cfg` (defaults to `~/.android`)
    pub user_config_dir: Option<PathBuf>,
    /// Text sdkmanager prints when it wants a license confirmation
    pub prompt_marker: String,
    /// Answer written for each confirmation
    pub acceptance_token: String,
    /// How many answers are written per detected prompt
    pub acceptance_repeats: usize,
    /// Environment variable pointing sdkmanager at the bundled JDK
    pub java_home_var: String,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            user_config_dir: None,
            prompt_marker: "Accept? (y/N):".to_string(),
            acceptance_token: "y".to_string(),
            acceptance_repeats: 10,
            java_home_var: "JAVA_HOME".to_string(),
        }
    }
}

impl AndroidConfig {
    /// Resolve the per-user Android directory
    pub fn user_config_dir(&self) -> Result<PathBuf> {
        match &self.user_config_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".android"))
                .ok_or_else(|| CiError::Config("Cannot determine home directory".into())),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CiConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Android provisioning settings
    pub android: AndroidConfig,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            version: 1,
            logging: LoggingConfig::default(),
            android: AndroidConfig::default(),
        }
    }
}

impl CiConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "unity-ci", "unity-ci")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from `path`, or from the platform config file.
    ///
    /// An explicit path must exist; the platform file falls back to defaults.
    /// Nothing is written back, CI runners often have read-only homes.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(CiError::NotFound(format!("Config file not found: {:?}", path)));
            }
            return Self::load_from(path).await;
        }

        match Self::config_file() {
            Some(config_file) if config_file.exists() => Self::load_from(&config_file).await,
            _ => {
                info!("Config file not found, using defaults");
                Ok(Self::default())
            }
        }
    }

    async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: CiConfig = toml::from_str(contents)?;
        if config.android.acceptance_repeats == 0 {
            return Err(CiError::Config("android.acceptance_repeats must be at least 1".into()));
        }
        Ok(config)
    }
}
