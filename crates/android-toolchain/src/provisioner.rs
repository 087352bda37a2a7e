//! Platform SDK Provisioner
//!
//! Makes sure the Android platform SDK a project targets exists inside an
//! editor installation, installing it with the bundled sdkmanager when it
//! does not.
//!
//! Not safe to run concurrently for the same editor root: the per-user
//! `repositories.cfg` is shared and the install steps race on the same
//! platform directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use unity_ci_core::config::AndroidConfig;
use unity_ci_core::events::{Event, EventSink, LogLevel};
use unity_ci_core::project::ProjectSettings;

use crate::detector::EditorRoot;
use crate::env::{AndroidUserConfig, HostPlatform};
use crate::jdk::{BundledJdk, BUNDLED_JDK_DIR};
use crate::process::InteractivePrompt;
use crate::sdk_manager::{SdkComponent, SdkManager};
use crate::ProvisionError;

/// Target API level inside one editor installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSdkTarget {
    pub api_level: u32,
    pub editor_root: PathBuf,
}

/// Successful provisioning result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationOutcome {
    /// The project has no Android target SDK; nothing was touched
    NotConfigured,
    /// Platform directory was already installed
    AlreadyPresent(PathBuf),
    /// Platform directory was installed by this run
    Installed(PathBuf),
}

impl InstallationOutcome {
    /// Installed platform directory, if there is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            InstallationOutcome::NotConfigured => None,
            InstallationOutcome::AlreadyPresent(path) | InstallationOutcome::Installed(path) => Some(path),
        }
    }
}

/// Drives the check / install / verify workflow
pub struct PlatformSdkProvisioner {
    config: AndroidConfig,
    sink: Arc<dyn EventSink>,
}

impl PlatformSdkProvisioner {
    pub fn new(config: AndroidConfig, sink: Arc<dyn EventSink>) -> Self {
        Self { config, sink }
    }

    /// Provision the SDK that the project at `project_path` targets
    pub async fn ensure_platform_sdk(
        &self,
        editor_root: &Path,
        project_path: &Path,
    ) -> Result<InstallationOutcome, ProvisionError> {
        let settings = ProjectSettings::load(project_path).await?;

        let Some(api_level) = settings.android_target_sdk else {
            self.sink.log(
                LogLevel::Info,
                format!("No Android target SDK in {:?}, nothing to provision", settings.path),
            );
            return Ok(InstallationOutcome::NotConfigured);
        };

        self.provision(&PlatformSdkTarget {
            api_level,
            editor_root: editor_root.to_path_buf(),
        })
        .await
    }

    /// Provision an explicit target
    pub async fn provision(&self, target: &PlatformSdkTarget) -> Result<InstallationOutcome, ProvisionError> {
        let editor = EditorRoot::new(&target.editor_root);
        if !tokio::fs::metadata(editor.path()).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(ProvisionError::EditorRootNotFound(target.editor_root.clone()));
        }

        let user_config = AndroidUserConfig::new(
            self.config
                .user_config_dir()
                .map_err(ProvisionError::Project)?,
        );
        user_config.reset(self.sink.as_ref()).await?;

        if let Some(path) = self.find_platform(&editor, target.api_level).await? {
            self.sink.emit(Event::SdkPresent {
                api_level: target.api_level,
                path: path.clone(),
            });
            return Ok(InstallationOutcome::AlreadyPresent(path));
        }

        info!(
            "Android SDK platform {} missing under {:?}, installing",
            target.api_level, target.editor_root
        );

        let sdk_manager = self.discover_tools(&editor).await?;

        sdk_manager
            .accept_licenses()
            .await
            .map_err(|source| ProvisionError::Subprocess {
                operation: "accept licenses",
                source,
            })?;
        sdk_manager
            .update_all()
            .await
            .map_err(|source| ProvisionError::Subprocess {
                operation: "update package index",
                source,
            })?;
        sdk_manager
            .install(&[SdkComponent::PlatformTools, SdkComponent::Platform(target.api_level)])
            .await
            .map_err(|source| ProvisionError::Subprocess {
                operation: "install platform packages",
                source,
            })?;

        match self.find_platform(&editor, target.api_level).await? {
            Some(path) => {
                self.sink.emit(Event::SdkInstalled {
                    api_level: target.api_level,
                    path: path.clone(),
                });
                Ok(InstallationOutcome::Installed(path))
            }
            None => Err(ProvisionError::InstallationFailed {
                api_level: target.api_level,
                editor_root: target.editor_root.clone(),
            }),
        }
    }

    async fn find_platform(&self, editor: &EditorRoot, api_level: u32) -> Result<Option<PathBuf>, ProvisionError> {
        editor
            .find_platform_sdk(api_level)
            .await
            .map_err(|source| ProvisionError::Io {
                operation: "search for platform SDK",
                path: editor.path().to_path_buf(),
                source,
            })
    }

    /// Locate the bundled JDK and sdkmanager; there is no other source for either
    async fn discover_tools(&self, editor: &EditorRoot) -> Result<SdkManager, ProvisionError> {
        let host = HostPlatform::current()?;
        let search_error = |source: std::io::Error| ProvisionError::Io {
            operation: "search for bundled tools",
            path: editor.path().to_path_buf(),
            source,
        };

        let jdk = BundledJdk::locate(editor)
            .await
            .map_err(search_error)?
            .ok_or_else(|| ProvisionError::ToolNotFound {
                tool: BUNDLED_JDK_DIR.to_string(),
                editor_root: editor.path().to_path_buf(),
            })?;
        self.sink.emit(Event::ToolLocated {
            tool: BUNDLED_JDK_DIR.to_string(),
            path: jdk.path().to_path_buf(),
        });

        let sdkmanager = SdkManager::locate(editor, host)
            .await
            .map_err(search_error)?
            .ok_or_else(|| ProvisionError::ToolNotFound {
                tool: host.sdkmanager_name().to_string(),
                editor_root: editor.path().to_path_buf(),
            })?;
        let sdk_manager = SdkManager::new(
            sdkmanager,
            &jdk,
            &self.config.java_home_var,
            InteractivePrompt::from_config(&self.config),
            Arc::clone(&self.sink),
        );
        self.sink.emit(Event::ToolLocated {
            tool: host.sdkmanager_name().to_string(),
            path: sdk_manager.path().to_path_buf(),
        });

        Ok(sdk_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unity_ci_core::events::{EventBus, EventSubscription};

    struct Fixture {
        _dir: tempfile::TempDir,
        editor_root: PathBuf,
        project: PathBuf,
        android_home: PathBuf,
    }

    impl Fixture {
        fn new(target_sdk: u32) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let editor_root = dir.path().join("2022.3.5f1");
            std::fs::create_dir_all(Self::player_of(&editor_root)).unwrap();

            let project = dir.path().join("project");
            let settings = project.join("ProjectSettings");
            std::fs::create_dir_all(&settings).unwrap();
            std::fs::write(
                settings.join("ProjectSettings.asset"),
                format!("PlayerSettings:\n  AndroidTargetSdkVersion: {}\n", target_sdk),
            )
            .unwrap();

            let android_home = dir.path().join("home").join(".android");
            Self {
                _dir: dir,
                editor_root,
                project,
                android_home,
            }
        }

        fn player_of(editor_root: &Path) -> PathBuf {
            editor_root.join("Editor").join("Data").join("PlaybackEngines").join("AndroidPlayer")
        }

        fn player(&self) -> PathBuf {
            Self::player_of(&self.editor_root)
        }

        fn platform_dir(&self, api_level: u32) -> PathBuf {
            self.player().join("SDK").join("platforms").join(format!("android-{}", api_level))
        }

        fn provisioner(&self) -> (PlatformSdkProvisioner, EventSubscription) {
            let bus = Arc::new(EventBus::new());
            let events = bus.subscribe();
            let config = AndroidConfig {
                user_config_dir: Some(self.android_home.clone()),
                ..AndroidConfig::default()
            };
            (PlatformSdkProvisioner::new(config, bus), events)
        }

        #[cfg(unix)]
        fn install_tools(&self, script: &str) -> PathBuf {
            use std::os::unix::fs::PermissionsExt;

            std::fs::create_dir_all(self.player().join("OpenJDK").join("bin")).unwrap();
            let bin = self.player().join("SDK").join("cmdline-tools").join("6.0").join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            let sdkmanager = bin.join("sdkmanager");
            std::fs::write(&sdkmanager, script).unwrap();
            std::fs::set_permissions(&sdkmanager, std::fs::Permissions::from_mode(0o755)).unwrap();
            sdkmanager
        }
    }

    fn started_args(events: &[Event]) -> Vec<Vec<String>> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::SubprocessStarted { args, .. } => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_no_target_sdk_is_a_no_op() {
        let fixture = Fixture::new(0);
        let (provisioner, events) = fixture.provisioner();

        let outcome = provisioner
            .ensure_platform_sdk(&fixture.editor_root, &fixture.project)
            .await
            .unwrap();

        assert_eq!(outcome, InstallationOutcome::NotConfigured);
        assert!(!fixture.android_home.exists());
        assert!(started_args(&events.drain()).is_empty());
    }

    #[tokio::test]
    async fn test_already_present_is_idempotent() {
        let fixture = Fixture::new(34);
        std::fs::create_dir_all(fixture.platform_dir(34)).unwrap();
        std::fs::create_dir_all(&fixture.android_home).unwrap();
        std::fs::write(fixture.android_home.join("repositories.cfg"), "stale").unwrap();
        let (provisioner, events) = fixture.provisioner();

        for _ in 0..2 {
            let outcome = provisioner
                .ensure_platform_sdk(&fixture.editor_root, &fixture.project)
                .await
                .unwrap();
            assert_eq!(outcome, InstallationOutcome::AlreadyPresent(fixture.platform_dir(34)));
        }

        assert_eq!(std::fs::read(fixture.android_home.join("repositories.cfg")).unwrap(), b"");
        let events = events.drain();
        assert!(started_args(&events).is_empty());
        assert_eq!(events.iter().filter(|e| matches!(e, Event::ConfigReset { .. })).count(), 2);
    }

    #[tokio::test]
    async fn test_missing_tools() {
        let fixture = Fixture::new(34);
        let (provisioner, _events) = fixture.provisioner();

        let err = provisioner
            .ensure_platform_sdk(&fixture.editor_root, &fixture.project)
            .await
            .unwrap_err();

        match err {
            ProvisionError::ToolNotFound { tool, editor_root } => {
                assert_eq!(tool, BUNDLED_JDK_DIR);
                assert_eq!(editor_root, fixture.editor_root);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_editor_root() {
        let fixture = Fixture::new(34);
        let (provisioner, _events) = fixture.provisioner();
        let missing = fixture.editor_root.join("does-not-exist");

        let err = provisioner
            .ensure_platform_sdk(&missing, &fixture.project)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::EditorRootNotFound(ref path) if *path == missing));
    }

    #[tokio::test]
    async fn test_missing_project_settings() {
        let fixture = Fixture::new(34);
        let (provisioner, _events) = fixture.provisioner();

        let err = provisioner
            .ensure_platform_sdk(&fixture.editor_root, &fixture.editor_root)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Project(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_installs_missing_platform() {
        let fixture = Fixture::new(34);
        let sdkmanager = fixture.install_tools(
            "#!/bin/sh\n\
             echo \"JAVA_HOME=$JAVA_HOME\"\n\
             case \"$1\" in\n\
               --licenses) printf 'Review license\\nAccept? (y/N): '; read answer; echo \"accepted=$answer\" ;;\n\
               --update) echo 'index updated' ;;\n\
               *) mkdir -p \"$(dirname \"$0\")/../../../platforms/android-34\" ;;\n\
             esac\n",
        );
        let (provisioner, events) = fixture.provisioner();

        let outcome = provisioner
            .ensure_platform_sdk(&fixture.editor_root, &fixture.project)
            .await
            .unwrap();

        let expected = fixture.platform_dir(34);
        assert!(matches!(outcome, InstallationOutcome::Installed(ref path)
            if path.canonicalize().unwrap() == expected.canonicalize().unwrap()));

        let events = events.drain();
        assert_eq!(
            started_args(&events),
            vec![
                vec!["--licenses".to_string()],
                vec!["--update".to_string()],
                vec!["platform-tools".to_string(), "platforms;android-34".to_string()],
            ]
        );
        assert!(events.iter().any(|e| matches!(e, Event::PromptAnswered { .. })));
        assert!(events.contains(&Event::ToolLocated {
            tool: "sdkmanager".to_string(),
            path: sdkmanager,
        }));
        assert!(events.contains(&Event::SubprocessOutput {
            stream: unity_ci_core::OutputStream::Stdout,
            line: format!("JAVA_HOME={}", fixture.player().join("OpenJDK").display()),
        }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_that_produces_nothing_fails() {
        let fixture = Fixture::new(34);
        fixture.install_tools("#!/bin/sh\nexit 0\n");
        let (provisioner, events) = fixture.provisioner();

        let err = provisioner
            .ensure_platform_sdk(&fixture.editor_root, &fixture.project)
            .await
            .unwrap_err();

        match err {
            ProvisionError::InstallationFailed { api_level, editor_root } => {
                assert_eq!(api_level, 34);
                assert_eq!(editor_root, fixture.editor_root);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(started_args(&events.drain()).len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_step_aborts_workflow() {
        let fixture = Fixture::new(34);
        fixture.install_tools("#!/bin/sh\n[ \"$1\" = \"--licenses\" ] && exit 1\nexit 0\n");
        let (provisioner, events) = fixture.provisioner();

        let err = provisioner
            .ensure_platform_sdk(&fixture.editor_root, &fixture.project)
            .await
            .unwrap_err();

        match err {
            ProvisionError::Subprocess { operation, source } => {
                assert_eq!(operation, "accept licenses");
                assert!(matches!(source, crate::ProcessError::SubprocessFailed { exit_code: 1, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(started_args(&events.drain()), vec![vec!["--licenses".to_string()]]);
    }
}
