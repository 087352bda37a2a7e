//! Android Toolchain Provisioning
//!
//! Makes the Android platform SDK a Unity project targets available inside
//! an editor installation:
//! - Locating the bundled OpenJDK and sdkmanager
//! - Resetting the per-user `repositories.cfg`
//! - Accepting licenses and installing platform packages non-interactively

pub mod detector;
pub mod env;
pub mod jdk;
pub mod process;
pub mod provisioner;
pub mod sdk_manager;

use std::path::PathBuf;

pub use detector::{EditorRoot, EntryKind};
pub use env::{AndroidUserConfig, HostPlatform};
pub use jdk::BundledJdk;
pub use process::{run_interactive, InteractivePrompt, Invocation, ProcessError};
pub use provisioner::{InstallationOutcome, PlatformSdkProvisioner, PlatformSdkTarget};
pub use sdk_manager::{SdkComponent, SdkManager};

/// Provisioning errors
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Unsupported host platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Editor root {0:?} does not exist")]
    EditorRootNotFound(PathBuf),

    #[error("{tool} not found in editor installation {editor_root:?}")]
    ToolNotFound { tool: String, editor_root: PathBuf },

    #[error("Failed to {operation}: {source}")]
    Subprocess {
        operation: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("Android SDK platform {api_level} still missing under {editor_root:?} after install")]
    InstallationFailed { api_level: u32, editor_root: PathBuf },

    #[error(transparent)]
    Project(#[from] unity_ci_core::CiError),

    #[error("Failed to {operation} at {path:?}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
