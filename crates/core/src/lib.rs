//! unity-ci Core - shared types
//!
//! Error handling, configuration, diagnostic events and Unity project file
//! readers used by the resolver, the Android provisioner and the CLI.

pub mod config;
pub mod error;
pub mod events;
pub mod project;

pub use config::{AndroidConfig, CiConfig, LoggingConfig};
pub use error::{CiError, Result};
pub use events::{Event, EventBus, EventSink, EventSubscription, LogLevel, OutputStream};
pub use project::{ProjectSettings, ProjectVersion};

