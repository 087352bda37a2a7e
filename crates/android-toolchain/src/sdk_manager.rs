//! SDK Manager
//!
//! Wraps the sdkmanager bundled with the editor to accept licenses and install
//! SDK components.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use unity_ci_core::events::EventSink;

use crate::detector::{EditorRoot, EntryKind};
use crate::env::HostPlatform;
use crate::jdk::BundledJdk;
use crate::process::{run_interactive, InteractivePrompt, Invocation, ProcessError};

/// SDK component types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkComponent {
    Platform(u32),          // platforms;android-XX
    PlatformTools,          // platform-tools
}

impl SdkComponent {
    /// Get the SDK manager package name
    pub fn package_name(&self) -> String {
        match self {
            SdkComponent::Platform(api) => format!("platforms;android-{}", api),
            SdkComponent::PlatformTools => "platform-tools".to_string(),
        }
    }
}

/// Bundled sdkmanager wrapper
pub struct SdkManager {
    sdkmanager_path: PathBuf,
    java_env: (String, OsString),
    prompt: InteractivePrompt,
    sink: Arc<dyn EventSink>,
}

impl SdkManager {
    /// Create a wrapper that runs `sdkmanager_path` against `jdk`
    pub fn new(
        sdkmanager_path: PathBuf,
        jdk: &BundledJdk,
        java_home_var: &str,
        prompt: InteractivePrompt,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            sdkmanager_path,
            java_env: jdk.env_var(java_home_var),
            prompt,
            sink,
        }
    }

    /// Find the sdkmanager launcher for `host` under `editor`
    pub async fn locate(editor: &EditorRoot, host: HostPlatform) -> std::io::Result<Option<PathBuf>> {
        editor.find(host.sdkmanager_name().to_string(), EntryKind::File).await
    }

    pub fn path(&self) -> &Path {
        &self.sdkmanager_path
    }

    /// Create the base invocation with the JDK override
    fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (key, value) = &self.java_env;
        Invocation::new(&self.sdkmanager_path)
            .args(args)
            .env(key.clone(), value.clone())
    }

    async fn run(&self, invocation: Invocation) -> Result<(), ProcessError> {
        run_interactive(&invocation, &self.prompt, self.sink.as_ref()).await
    }

    /// Accept all outstanding licenses
    pub async fn accept_licenses(&self) -> Result<(), ProcessError> {
        info!("Accepting Android SDK licenses...");
        self.run(self.invocation(["--licenses"])).await?;
        info!("Licenses accepted");
        Ok(())
    }

    /// Refresh installed packages and the local package index
    pub async fn update_all(&self) -> Result<(), ProcessError> {
        info!("Updating Android SDK packages...");
        self.run(self.invocation(["--update"])).await
    }

    /// Install SDK components in a single sdkmanager run
    pub async fn install(&self, components: &[SdkComponent]) -> Result<(), ProcessError> {
        let packages: Vec<String> = components.iter().map(|c| c.package_name()).collect();

        info!("Installing SDK packages: {:?}", packages);
        self.run(self.invocation(packages)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unity_ci_core::events::EventBus;

    #[test]
    fn test_component_package_name() {
        assert_eq!(SdkComponent::Platform(34).package_name(), "platforms;android-34");
        assert_eq!(SdkComponent::PlatformTools.package_name(), "platform-tools");
    }

    #[test]
    fn test_invocation_carries_java_home() {
        let jdk = BundledJdk::new(PathBuf::from("/editor/AndroidPlayer/OpenJDK"));
        let manager = SdkManager::new(
            PathBuf::from("/editor/AndroidPlayer/SDK/cmdline-tools/6.0/bin/sdkmanager"),
            &jdk,
            "JAVA_HOME",
            InteractivePrompt::default(),
            Arc::new(EventBus::new()),
        );

        let invocation = manager.invocation([
            SdkComponent::PlatformTools.package_name(),
            SdkComponent::Platform(34).package_name(),
        ]);
        assert_eq!(invocation.args, vec!["platform-tools", "platforms;android-34"]);
        assert_eq!(
            invocation.env,
            vec![("JAVA_HOME".to_string(), OsString::from("/editor/AndroidPlayer/OpenJDK"))]
        );
    }
}
