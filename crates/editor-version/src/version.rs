//! Unity Version Values
//!
//! A version string as requested or resolved, with its coerced semantic value
//! used for comparisons and range checks.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::VersionError;

static COERCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("valid regex"));

/// First version that ships Apple Silicon / ARM64 editors
const ARM64_FLOOR: Version = Version::new(2021, 0, 0);

/// Coerce free text into `major.minor.patch`, missing parts default to 0.
///
/// The first run of digits found anywhere in `text` anchors the version, so
/// `"2022.x"` becomes `2022.0.0` and `"2021.3.5f1"` becomes `2021.3.5`.
pub fn coerce(text: &str) -> Option<Version> {
    let caps = COERCE_RE.captures(text)?;
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Editor CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86_64,
    Arm64,
}

impl Architecture {
    /// Architecture of the machine running unity-ci
    pub fn host() -> Self {
        Self::from_target_arch(std::env::consts::ARCH)
    }

    fn from_target_arch(arch: &str) -> Self {
        match arch {
            "aarch64" | "arm64" => Architecture::Arm64,
            _ => Architecture::X86_64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "x86_64" | "x64" | "amd64" => Some(Architecture::X86_64),
            "arm64" | "aarch64" => Some(Architecture::Arm64),
            _ => None,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A version string together with its coerced semantic value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnityVersion {
    raw: String,
    semver: Version,
}

impl UnityVersion {
    /// Parse any text that coerces to a version
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let semver = coerce(text).ok_or_else(|| VersionError::InvalidVersionFormat(text.to_string()))?;
        Ok(Self {
            raw: text.to_string(),
            semver,
        })
    }

    /// The text the version was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.semver.major
    }

    /// Coerced semantic value
    pub fn semver(&self) -> &Version {
        &self.semver
    }

    /// Pre-Unity-5 versioning scheme
    pub fn is_legacy(&self) -> bool {
        self.semver.major <= 4
    }

    pub fn is_arm_compatible(&self) -> bool {
        self.semver >= ARM64_FLOOR
    }

    /// Whether the coerced `constraint` falls in the caret range anchored at
    /// this version's major
    pub fn satisfies(&self, constraint: &str) -> Result<bool, VersionError> {
        let wanted = coerce(constraint).ok_or_else(|| VersionError::InvalidVersion(constraint.to_string()))?;
        let req = VersionReq::parse(&format!("^{}", self.semver.major))
            .map_err(|_| VersionError::InvalidVersion(constraint.to_string()))?;
        Ok(req.matches(&wanted))
    }
}

impl Ord for UnityVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semver
            .cmp(&other.semver)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for UnityVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UnityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
