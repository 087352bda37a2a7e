//! Unity Project Files
//!
//! Reads the handful of fields unity-ci needs from a Unity project:
//! `AndroidTargetSdkVersion` from `ProjectSettings.asset` and the editor
//! version from `ProjectVersion.txt`.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{CiError, Result};

static TARGET_SDK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*AndroidTargetSdkVersion:\s*(\d+)\s*$").expect("valid regex"));

static EDITOR_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^m_EditorVersion:\s*(\S+)\s*$").expect("valid regex"));

static EDITOR_REVISION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^m_EditorVersionWithRevision:\s*(\S+)\s*\((\w+)\)\s*$").expect("valid regex")
});

/// Locate a file inside `ProjectSettings/`, accepting the file path itself too
fn settings_file(project: &Path, name: &str) -> PathBuf {
    if project.is_file() {
        project.to_path_buf()
    } else {
        project.join("ProjectSettings").join(name)
    }
}

async fn read_settings_file(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CiError::NotFound(format!("Project file not found: {:?}", path)))
        }
        Err(e) => Err(CiError::Io(e)),
    }
}

/// Fields read from `ProjectSettings.asset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    /// File the settings were read from
    pub path: PathBuf,
    /// Target Android API level; `None` when absent or 0
    pub android_target_sdk: Option<u32>,
}

impl ProjectSettings {
    /// Load `ProjectSettings/ProjectSettings.asset` under `project`
    pub async fn load(project: &Path) -> Result<Self> {
        let path = settings_file(project, "ProjectSettings.asset");
        let contents = read_settings_file(&path).await?;
        let settings = Self::parse(path, &contents)?;
        debug!("Android target SDK for {:?}: {:?}", settings.path, settings.android_target_sdk);
        Ok(settings)
    }

    /// Parse settings text
    pub fn parse(path: PathBuf, contents: &str) -> Result<Self> {
        let android_target_sdk = match TARGET_SDK_RE.captures(contents) {
            Some(caps) => {
                let level: u32 = caps[1].parse().map_err(|_| {
                    CiError::Project(format!("AndroidTargetSdkVersion out of range in {:?}", path))
                })?;
                Some(level).filter(|level| *level != 0)
            }
            None => None,
        };

        Ok(Self {
            path,
            android_target_sdk,
        })
    }
}

/// Editor version pinned by `ProjectVersion.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion {
    pub version: String,
    pub changeset: Option<String>,
}

impl ProjectVersion {
    /// Load `ProjectSettings/ProjectVersion.txt` under `project`
    pub async fn load(project: &Path) -> Result<Self> {
        let path = settings_file(project, "ProjectVersion.txt");
        let contents = read_settings_file(&path).await?;
        Self::parse(&contents)
            .ok_or_else(|| CiError::Project(format!("No m_EditorVersion in {:?}", path)))
    }

    /// Parse version text; the revision line wins since it carries the changeset
    pub fn parse(contents: &str) -> Option<Self> {
        if let Some(caps) = EDITOR_REVISION_RE.captures(contents) {
            return Some(Self {
                version: caps[1].to_string(),
                changeset: Some(caps[2].to_string()),
            });
        }

        EDITOR_VERSION_RE.captures(contents).map(|caps| Self {
            version: caps[1].to_string(),
            changeset: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = "PlayerSettings:\n  AndroidMinSdkVersion: 23\n  AndroidTargetSdkVersion: 34\n  AndroidPreferredInstallLocation: 1\n";

    #[test]
    fn test_parse_target_sdk() {
        let settings = ProjectSettings::parse(PathBuf::from("p"), SETTINGS).unwrap();
        assert_eq!(settings.android_target_sdk, Some(34));
    }

    #[test]
    fn test_zero_and_missing_target_sdk() {
        let zero = ProjectSettings::parse(PathBuf::from("p"), "  AndroidTargetSdkVersion: 0\n").unwrap();
        assert_eq!(zero.android_target_sdk, None);

        let missing = ProjectSettings::parse(PathBuf::from("p"), "PlayerSettings:\n").unwrap();
        assert_eq!(missing.android_target_sdk, None);
    }

    #[test]
    fn test_out_of_range_target_sdk() {
        let err = ProjectSettings::parse(
            PathBuf::from("p"),
            "  AndroidTargetSdkVersion: 99999999999\n",
        )
        .unwrap_err();
        assert!(matches!(err, CiError::Project(_)));
    }

    #[test]
    fn test_parse_project_version() {
        let text = "m_EditorVersion: 2022.3.5f1\nm_EditorVersionWithRevision: 2022.3.5f1 (9674261d40ee)\n";
        let version = ProjectVersion::parse(text).unwrap();
        assert_eq!(version.version, "2022.3.5f1");
        assert_eq!(version.changeset.as_deref(), Some("9674261d40ee"));

        let bare = ProjectVersion::parse("m_EditorVersion: 2019.4.1f1\n").unwrap();
        assert_eq!(bare.changeset, None);

        assert!(ProjectVersion::parse("nothing here").is_none());
    }

    #[tokio::test]
    async fn test_load_from_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings_dir = dir.path().join("ProjectSettings");
        std::fs::create_dir_all(&settings_dir).unwrap();
        std::fs::write(settings_dir.join("ProjectSettings.asset"), SETTINGS).unwrap();

        let settings = ProjectSettings::load(dir.path()).await.unwrap();
        assert_eq!(settings.android_target_sdk, Some(34));
        assert_eq!(settings.path, settings_dir.join("ProjectSettings.asset"));
    }

    #[tokio::test]
    async fn test_load_missing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectSettings::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, CiError::NotFound(_)));
    }
}
