//! Release Catalog Resolution
//!
//! Maps a [`VersionSpec`] onto one fully-qualified release from a catalog of
//! free-form release strings.

use serde::Serialize;
use tracing::debug;

use crate::spec::{MinorRequest, VersionSpec};
use crate::token::{Channel, ReleaseToken};
use crate::version::Architecture;
use crate::VersionError;

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub version: String,
    /// Always `None`: a changeset only identifies the entry it was given for
    pub changeset: Option<String>,
    pub architecture: Architecture,
}

impl ResolvedVersion {
    fn new(version: &str, architecture: Architecture) -> Self {
        Self {
            version: version.to_string(),
            changeset: None,
            architecture,
        }
    }
}

/// Resolve `spec` against `catalog`.
///
/// A fully-qualified request only ever matches itself. Partial and wildcard
/// requests pick the newest final release of the requested line. `None`
/// means nothing in the catalog fits.
pub fn resolve<S: AsRef<str>>(spec: &VersionSpec, catalog: &[S]) -> Option<ResolvedVersion> {
    let entries: Vec<(ReleaseToken, &str)> = catalog
        .iter()
        .filter_map(|entry| ReleaseToken::find_in(entry.as_ref()))
        .collect();

    if spec.is_fully_qualified() {
        if let Some((_, text)) = entries.iter().find(|(_, text)| *text == spec.requested()) {
            debug!("Exact catalog match for {}", text);
            return Some(ResolvedVersion::new(text, spec.architecture()));
        }
        debug!("{} is not in the catalog", spec.requested());
        return None;
    }

    let minor = spec.minor();
    let mut best = best_final(&entries, spec.major(), minor);
    if best.is_none() && minor == MinorRequest::Explicit(0) {
        debug!("No {}.0 final release, widening to any minor", spec.major());
        best = best_final(&entries, spec.major(), MinorRequest::Omitted);
    }

    match best {
        Some(text) => {
            debug!("Resolved {} to {}", spec.requested(), text);
            Some(ResolvedVersion::new(text, spec.architecture()))
        }
        None => {
            debug!("No final release matches {}", spec.requested());
            None
        }
    }
}

/// Like [`resolve`], for callers that cannot continue without a match
pub fn resolve_required<S: AsRef<str>>(
    spec: &VersionSpec,
    catalog: &[S],
) -> Result<ResolvedVersion, VersionError> {
    resolve(spec, catalog).ok_or_else(|| VersionError::NoMatch {
        requested: spec.requested().to_string(),
    })
}

/// Newest final release of `major` whose minor passes `minor`; first seen wins ties
fn best_final<'a>(entries: &[(ReleaseToken, &'a str)], major: u64, minor: MinorRequest) -> Option<&'a str> {
    let mut best: Option<(ReleaseToken, &'a str)> = None;

    for (token, text) in entries {
        if token.channel != Channel::Final || u64::from(token.major) != major || !minor.accepts(token.minor) {
            continue;
        }
        let newer = match &best {
            Some((current, _)) => token.rank_key() > current.rank_key(),
            None => true,
        };
        if newer {
            best = Some((*token, *text));
        }
    }

    best.map(|(_, text)| text)
}
