//! Bundled JDK
//!
//! Unity ships an OpenJDK inside the Android player module; sdkmanager is run
//! against it instead of whatever Java the CI image happens to have.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::detector::{EditorRoot, EntryKind};

/// Directory name of the JDK bundled with the Android player
pub const BUNDLED_JDK_DIR: &str = "OpenJDK";

/// The JDK bundled with an editor installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledJdk {
    path: PathBuf,
}

impl BundledJdk {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Find the bundled JDK under `editor`
    pub async fn locate(editor: &EditorRoot) -> std::io::Result<Option<Self>> {
        let found = editor.find(BUNDLED_JDK_DIR.to_string(), EntryKind::Dir).await?;
        if let Some(ref path) = found {
            info!("Using bundled JDK at {:?}", path);
        }
        Ok(found.map(Self::new))
    }

    /// Get the JDK path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment override pointing `var` (normally `JAVA_HOME`) at this JDK
    pub fn env_var(&self, var: &str) -> (String, OsString) {
        (var.to_string(), self.path.clone().into_os_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locate() {
        let root = tempfile::tempdir().unwrap();
        let editor = EditorRoot::new(root.path());
        assert_eq!(BundledJdk::locate(&editor).await.unwrap(), None);

        let jdk = root.path().join("PlaybackEngines").join("AndroidPlayer").join(BUNDLED_JDK_DIR);
        std::fs::create_dir_all(jdk.join("bin")).unwrap();

        let found = BundledJdk::locate(&editor).await.unwrap().unwrap();
        assert_eq!(found.path(), jdk.as_path());
        assert_eq!(found.env_var("JAVA_HOME"), ("JAVA_HOME".to_string(), jdk.into_os_string()));
    }
}
