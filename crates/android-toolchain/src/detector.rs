//! Editor Toolchain Detection
//!
//! Finds Android tooling bundled with a Unity Editor installation. Layouts
//! differ per platform and editor version (`Editor/Data/PlaybackEngines/...`
//! on Windows and Linux, `PlaybackEngines/...` next to `Unity.app` on macOS),
//! so everything is found by searching the `AndroidPlayer` sub-trees rather
//! than by fixed paths.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Directory that holds Android player support files
pub const ANDROID_PLAYER_DIR: &str = "AndroidPlayer";

/// `Editor/Data/PlaybackEngines/AndroidPlayer` is the deepest known layout
const ANDROID_PLAYER_MAX_DEPTH: usize = 6;

/// Large editor sub-trees that never contain the Android player
const PRUNED_DIRS: &[&str] = &["Mono", "MonoBleedingEdge", "il2cpp", "Frameworks"];

fn is_pruned(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name.ends_with(".framework") || PRUNED_DIRS.iter().any(|dir| *dir == name)
}

/// What kind of filesystem entry a search wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

/// An editor installation root
#[derive(Debug, Clone)]
pub struct EditorRoot {
    path: PathBuf,
}

impl EditorRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory name of an installed platform SDK
    pub fn platform_dir_name(api_level: u32) -> String {
        format!("android-{}", api_level)
    }

    /// Locate the installed `android-<api_level>` platform directory
    pub async fn find_platform_sdk(&self, api_level: u32) -> std::io::Result<Option<PathBuf>> {
        self.find(Self::platform_dir_name(api_level), EntryKind::Dir).await
    }

    /// Search every `AndroidPlayer` sub-tree for a readable entry named `name`
    pub async fn find(&self, name: String, kind: EntryKind) -> std::io::Result<Option<PathBuf>> {
        let root = self.path.clone();
        tokio::task::spawn_blocking(move || find_entry(&root, &name, kind))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

/// Every `AndroidPlayer` directory below `root`, not descending into them
pub fn android_player_dirs(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(ANDROID_PLAYER_MAX_DEPTH)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name() == ANDROID_PLAYER_DIR {
            found.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        } else if entry.depth() > 0 && is_pruned(entry.file_name()) {
            walker.skip_current_dir();
        }
    }

    found
}

/// First readable entry named `name` of the given kind inside an `AndroidPlayer` tree
pub fn find_entry(root: &Path, name: &str, kind: EntryKind) -> Option<PathBuf> {
    for player in android_player_dirs(root) {
        let found = WalkDir::new(&player)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| {
                e.file_name() == name
                    && match kind {
                        EntryKind::Dir => e.file_type().is_dir(),
                        EntryKind::File => e.file_type().is_file(),
                    }
                    && is_readable(e.path(), kind)
            })
            .map(|e| e.path().to_path_buf());

        if let Some(path) = found {
            debug!("Found {} at {:?}", name, path);
            return Some(path);
        }
    }

    debug!("{} not found under {:?}", name, root);
    None
}

fn is_readable(path: &Path, kind: EntryKind) -> bool {
    match kind {
        EntryKind::Dir => std::fs::read_dir(path).is_ok(),
        EntryKind::File => std::fs::File::open(path).is_ok(),
    }
}
