//! Version Requests
//!
//! What the caller asked for: a possibly partial or wildcarded version, an
//! optional changeset and the editor architecture.

use tracing::debug;

use crate::token::ReleaseToken;
use crate::version::{Architecture, UnityVersion};
use crate::VersionError;

/// Minor component of a request, kept distinct so `"6000"` and `"6000.0"`
/// resolve differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinorRequest {
    /// `"2022"`
    Omitted,
    /// `"2022.x"` or `"2022.*"`
    Wildcard,
    /// `"2022.3"`
    Explicit(u32),
}

impl MinorRequest {
    /// Whether an entry's minor passes this filter
    pub fn accepts(&self, minor: u32) -> bool {
        match self {
            MinorRequest::Omitted | MinorRequest::Wildcard => true,
            MinorRequest::Explicit(wanted) => *wanted == minor,
        }
    }
}

/// A requested editor version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    version: UnityVersion,
    changeset: Option<String>,
    architecture: Architecture,
}

impl VersionSpec {
    /// Build a request; `architecture` defaults to the host's.
    ///
    /// ARM64 is downgraded to x86_64 for majors without ARM64 editors.
    pub fn new(
        requested: &str,
        changeset: Option<String>,
        architecture: Option<Architecture>,
    ) -> Result<Self, VersionError> {
        let version = UnityVersion::parse(requested.trim())?;

        let mut architecture = architecture.unwrap_or_else(Architecture::host);
        if architecture == Architecture::Arm64 && !version.is_arm_compatible() {
            debug!("{} has no arm64 editor, using x86_64", version);
            architecture = Architecture::X86_64;
        }

        Ok(Self {
            version,
            changeset: changeset.filter(|c| !c.is_empty()),
            architecture,
        })
    }

    /// Raw requested text
    pub fn requested(&self) -> &str {
        self.version.as_str()
    }

    pub fn version(&self) -> &UnityVersion {
        &self.version
    }

    pub fn changeset(&self) -> Option<&str> {
        self.changeset.as_deref()
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Request is a complete release identifier such as `2022.3.5f1`
    pub fn is_fully_qualified(&self) -> bool {
        ReleaseToken::is_fully_qualified(self.requested())
    }

    /// Major component; always present since construction coerced it
    pub fn major(&self) -> u64 {
        self.version.major()
    }

    /// Minor component as written in the request
    pub fn minor(&self) -> MinorRequest {
        match self.requested().split('.').nth(1) {
            None | Some("") => MinorRequest::Omitted,
            Some("x") | Some("X") | Some("*") => MinorRequest::Wildcard,
            Some(minor) => {
                let digits: String = minor.chars().take_while(|c| c.is_ascii_digit()).collect();
                match digits.parse() {
                    Ok(value) => MinorRequest::Explicit(value),
                    Err(_) => MinorRequest::Omitted,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_forms() {
        let minor = |v: &str| VersionSpec::new(v, None, Some(Architecture::X86_64)).unwrap().minor();
        assert_eq!(minor("2022"), MinorRequest::Omitted);
        assert_eq!(minor("2022.x"), MinorRequest::Wildcard);
        assert_eq!(minor("2022.*"), MinorRequest::Wildcard);
        assert_eq!(minor("6000.0"), MinorRequest::Explicit(0));
        assert_eq!(minor("6000.00"), MinorRequest::Explicit(0));
        assert_eq!(minor("2021.3.5f1"), MinorRequest::Explicit(3));
    }

    #[test]
    fn test_major() {
        let spec = VersionSpec::new("2022.x", None, Some(Architecture::X86_64)).unwrap();
        assert_eq!(spec.major(), 2022);
        let spec = VersionSpec::new("6000", None, Some(Architecture::X86_64)).unwrap();
        assert_eq!(spec.major(), 6000);
    }

    #[test]
    fn test_invalid_request() {
        let err = VersionSpec::new("latest", None, None).unwrap_err();
        assert!(matches!(err, VersionError::InvalidVersionFormat(_)));
    }

    #[test]
    fn test_arm64_downgrade() {
        let old = VersionSpec::new("2020.3.48f1", None, Some(Architecture::Arm64)).unwrap();
        assert_eq!(old.architecture(), Architecture::X86_64);

        let new = VersionSpec::new("2021.3.5f1", None, Some(Architecture::Arm64)).unwrap();
        assert_eq!(new.architecture(), Architecture::Arm64);
    }

    #[test]
    fn test_default_architecture_follows_host() {
        let spec = VersionSpec::new("2022.3.5f1", None, None).unwrap();
        assert_eq!(spec.architecture(), Architecture::host());

        let old = VersionSpec::new("2019.4.1f1", None, None).unwrap();
        assert_eq!(old.architecture(), Architecture::X86_64);
    }

    #[test]
    fn test_fully_qualified_and_changeset() {
        let spec = VersionSpec::new("2022.3.5f1", Some("9674261d40ee".into()), None).unwrap();
        assert!(spec.is_fully_qualified());
        assert_eq!(spec.changeset(), Some("9674261d40ee"));

        let spec = VersionSpec::new("2022.3", Some(String::new()), None).unwrap();
        assert!(!spec.is_fully_qualified());
        assert_eq!(spec.changeset(), None);
    }
}
