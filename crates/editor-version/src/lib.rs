//! Unity Editor Versions
//!
//! Parses requested editor versions and resolves them against a catalog of
//! released versions:
//! - `2022.3.5f1` only matches itself
//! - `2022`, `2022.x`, `2022.*` pick the newest final 2022 release
//! - `2022.3` picks the newest final 2022.3 release
//! - `6000.0` falls back to any 6000 minor when no 6000.0 final exists

pub mod resolver;
pub mod spec;
pub mod token;
pub mod version;

pub use resolver::{resolve, resolve_required, ResolvedVersion};
pub use spec::{MinorRequest, VersionSpec};
pub use token::{Channel, ReleaseToken};
pub use version::{coerce, Architecture, UnityVersion};

/// Version errors
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version format: {0:?}")]
    InvalidVersionFormat(String),
    #[error("Invalid version: {0:?}")]
    InvalidVersion(String),
    #[error("No release in the catalog matches {requested:?}")]
    NoMatch { requested: String },
}
