//! unity-ci - Unity Editor toolchain provisioning for CI
//!
//! Resolves editor versions against a release catalog and provisions the
//! Android platform SDK inside editor installations.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use unity_ci::commands::{AndroidSdkCommand, ResolveCommand};
use unity_ci::core::CiConfig;
use unity_ci::version::Architecture;
use unity_ci::{APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "unity-ci", version, about = "Unity Editor toolchain provisioning for CI builds")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a requested editor version against a release catalog
    Resolve {
        /// Requested version, e.g. 2022.3.5f1, 2022.3, 2022.x
        #[arg(long)]
        version: Option<String>,
        /// Unity project whose ProjectVersion.txt supplies the version
        #[arg(long)]
        project: Option<PathBuf>,
        /// Catalog file with one release per line (stdin when omitted)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Editor architecture (x86_64 or arm64)
        #[arg(long, value_parser = parse_architecture)]
        arch: Option<Architecture>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Install the project's Android target SDK into an editor installation
    AndroidSdk {
        /// Editor installation root
        #[arg(long)]
        editor_root: PathBuf,
        /// Unity project directory
        #[arg(long)]
        project: PathBuf,
    },
}

fn parse_architecture(text: &str) -> std::result::Result<Architecture, String> {
    Architecture::parse(text).ok_or_else(|| format!("unknown architecture {:?}", text))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Printed directly so failures stay visible with logging turned off
fn failure_message(e: &anyhow::Error) -> String {
    format!("Error: {:#}", e)
}

async fn run(cli: Cli) -> Result<()> {
    let config = CiConfig::load(cli.config.as_deref()).await;
    init_logging(config.as_ref().map(|c| c.logging.level.as_str()).unwrap_or("info"))?;
    let config = config?;

    info!("{} v{} starting...", APP_NAME, VERSION);

    match cli.command {
        Command::Resolve {
            version,
            project,
            catalog,
            arch,
            json,
        } => {
            let command = ResolveCommand {
                version,
                project_path: project,
                catalog,
                architecture: arch,
                json,
            };
            let resolved = command.execute().await?;
            println!("{}", command.render(&resolved)?);
        }
        Command::AndroidSdk { editor_root, project } => {
            AndroidSdkCommand {
                editor_root,
                project_path: project,
            }
            .execute(&config)
            .await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout only carries command output; `RUST_LOG` wins
/// over the configured level
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
