//! unity-ci - Unity Editor toolchain provisioning for CI
//!
//! ## Architecture
//!
//! unity-ci is organized into specialized crates:
//!
//! - `unity-ci-core`: Configuration, errors, events and project files
//! - `unity-ci-editor-version`: Editor version parsing and catalog resolution
//! - `unity-ci-android-toolchain`: Android platform SDK provisioning

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use unity_ci_android_toolchain as toolchain;
pub use unity_ci_core as core;
pub use unity_ci_editor_version as version;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "unity-ci";

/// Prelude module for convenient imports
pub mod prelude {
    pub use unity_ci_android_toolchain::{InstallationOutcome, PlatformSdkProvisioner, PlatformSdkTarget};
    pub use unity_ci_core::{CiConfig, EventBus, EventSink};
    pub use unity_ci_editor_version::{resolve, Architecture, ResolvedVersion, VersionSpec};
}
