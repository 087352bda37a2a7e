//! CLI commands for unity-ci
//!
//! Command structs behind the `unity-ci` binary, usable from scripts and tests
//! without going through argument parsing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::io::AsyncBufReadExt;
use tracing::info;

use unity_ci_android_toolchain::{InstallationOutcome, PlatformSdkProvisioner};
use unity_ci_core::{CiConfig, EventBus, ProjectVersion};
use unity_ci_editor_version::{resolve_required, Architecture, ResolvedVersion, VersionSpec};

/// Resolve command options
pub struct ResolveCommand {
    /// Requested version; read from the project when absent
    pub version: Option<String>,
    /// Unity project used when no version is given
    pub project_path: Option<PathBuf>,
    /// Catalog file, one release per line; stdin when absent
    pub catalog: Option<PathBuf>,
    /// Architecture override
    pub architecture: Option<Architecture>,
    /// Print the result as JSON
    pub json: bool,
}

impl ResolveCommand {
    /// Resolve the requested version against the catalog
    pub async fn execute(&self) -> Result<ResolvedVersion> {
        let (requested, changeset) = self.requested_version().await?;
        let spec = VersionSpec::new(&requested, changeset, self.architecture)?;

        let catalog = match &self.catalog {
            Some(path) => read_catalog_file(path).await?,
            None => read_catalog_stdin().await?,
        };
        info!("Resolving {} against {} catalog entries", spec.requested(), catalog.len());

        let resolved = resolve_required(&spec, catalog.as_slice())?;
        info!("Resolved {} to {} ({})", spec.requested(), resolved.version, resolved.architecture);
        Ok(resolved)
    }

    /// Text printed for a resolved version
    pub fn render(&self, resolved: &ResolvedVersion) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(resolved)?)
        } else {
            Ok(resolved.version.clone())
        }
    }

    async fn requested_version(&self) -> Result<(String, Option<String>)> {
        if let Some(version) = &self.version {
            return Ok((version.clone(), None));
        }

        let project = self
            .project_path
            .as_deref()
            .ok_or_else(|| anyhow!("Either --version or --project is required"))?;
        let pinned = ProjectVersion::load(project).await?;
        info!("Project {:?} pins editor {}", project, pinned.version);
        Ok((pinned.version, pinned.changeset))
    }
}

/// Catalog entries from text: one per line, blank lines skipped
pub fn parse_catalog(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

async fn read_catalog_file(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog {:?}", path))?;
    Ok(parse_catalog(&contents))
}

async fn read_catalog_stdin() -> Result<Vec<String>> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut entries = Vec::new();
    while let Some(line) = lines.next_line().await.context("Failed to read catalog from stdin")? {
        let line = line.trim();
        if !line.is_empty() {
            entries.push(line.to_string());
        }
    }
    Ok(entries)
}

/// Android SDK provisioning command options
pub struct AndroidSdkCommand {
    /// Editor installation to provision
    pub editor_root: PathBuf,
    /// Unity project whose target SDK is provisioned
    pub project_path: PathBuf,
}

impl AndroidSdkCommand {
    /// Make sure the project's target SDK exists in the editor installation
    pub async fn execute(&self, config: &CiConfig) -> Result<InstallationOutcome> {
        let bus = Arc::new(EventBus::new());
        let provisioner = PlatformSdkProvisioner::new(config.android.clone(), bus);

        let outcome = provisioner
            .ensure_platform_sdk(&self.editor_root, &self.project_path)
            .await?;

        match &outcome {
            InstallationOutcome::NotConfigured => info!("Project has no Android target SDK"),
            InstallationOutcome::AlreadyPresent(path) => info!("Android SDK platform already at {:?}", path),
            InstallationOutcome::Installed(path) => info!("Android SDK platform installed at {:?}", path),
        }
        Ok(outcome)
    }
}
