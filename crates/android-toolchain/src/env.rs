//! Host Environment
//!
//! Host platform detection and the per-user Android configuration that
//! sdkmanager reads on every run.

use std::path::PathBuf;

use tracing::debug;
use unity_ci_core::events::{Event, EventSink};

use crate::ProvisionError;

/// File sdkmanager loads user-defined repositories from
pub const REPOSITORIES_CFG: &str = "repositories.cfg";

/// Host operating systems with a bundled sdkmanager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    MacOs,
    Linux,
}

impl HostPlatform {
    /// Platform unity-ci is running on
    pub fn current() -> Result<Self, ProvisionError> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Self, ProvisionError> {
        match os {
            "windows" => Ok(HostPlatform::Windows),
            "macos" => Ok(HostPlatform::MacOs),
            "linux" => Ok(HostPlatform::Linux),
            other => Err(ProvisionError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// File name of the sdkmanager launcher
    pub fn sdkmanager_name(&self) -> &'static str {
        match self {
            HostPlatform::Windows => "sdkmanager.bat",
            HostPlatform::MacOs | HostPlatform::Linux => "sdkmanager",
        }
    }
}

/// The per-user Android directory (`~/.android` by default)
#[derive(Debug, Clone)]
pub struct AndroidUserConfig {
    dir: PathBuf,
}

impl AndroidUserConfig {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn repositories_cfg(&self) -> PathBuf {
        self.dir.join(REPOSITORIES_CFG)
    }

    /// Make sure the directory exists and `repositories.cfg` is empty.
    ///
    /// sdkmanager fails non-interactively on a missing or stale file, so this
    /// runs before every provisioning attempt.
    pub async fn reset(&self, sink: &dyn EventSink) -> Result<PathBuf, ProvisionError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ProvisionError::Io {
                operation: "create Android user directory",
                path: self.dir.clone(),
                source,
            })?;

        let path = self.repositories_cfg();
        tokio::fs::write(&path, b"")
            .await
            .map_err(|source| ProvisionError::Io {
                operation: "reset repositories.cfg",
                path: path.clone(),
                source,
            })?;

        debug!("Truncated {:?}", path);
        sink.emit(Event::ConfigReset { path: path.clone() });
        Ok(path)
    }
}
