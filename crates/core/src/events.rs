//! Event System
//!
//! Diagnostic events emitted by the provisioning workflow. Components take an
//! [`EventSink`] at construction instead of logging through a global, so callers
//! and tests can observe exactly what happened.

use std::path::PathBuf;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};

/// Which stream of a child process a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Events emitted while provisioning an editor toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Per-user Android repositories file was truncated
    ConfigReset { path: PathBuf },
    /// Target platform SDK directory found on disk
    SdkPresent { api_level: u32, path: PathBuf },
    /// A bundled tool was located under the editor root
    ToolLocated { tool: String, path: PathBuf },
    /// Child process spawned
    SubprocessStarted { executable: PathBuf, args: Vec<String> },
    /// One line of child process output
    SubprocessOutput { stream: OutputStream, line: String },
    /// Confirmation prompt detected and answered
    PromptAnswered { executable: PathBuf },
    /// Child process terminated; `code` is `None` when killed by a signal
    SubprocessExited { executable: PathBuf, code: Option<i32> },
    /// Target platform SDK installed and verified
    SdkInstalled { api_level: u32, path: PathBuf },
    /// Free-form log message
    Log { level: LogLevel, message: String },
}

/// Log levels for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Event {
    /// Severity the event is reported at
    pub fn level(&self) -> LogLevel {
        match self {
            Event::SubprocessOutput { stream: OutputStream::Stderr, .. } => LogLevel::Error,
            Event::SubprocessOutput { .. } | Event::PromptAnswered { .. } => LogLevel::Debug,
            Event::SubprocessExited { code: Some(0), .. } => LogLevel::Debug,
            Event::SubprocessExited { code: None, .. } => LogLevel::Warn,
            Event::SubprocessExited { .. } => LogLevel::Error,
            Event::Log { level, .. } => *level,
            _ => LogLevel::Info,
        }
    }

    /// Human readable rendering used for the tracing output
    pub fn message(&self) -> String {
        match self {
            Event::ConfigReset { path } => format!("Reset Android repositories config at {:?}", path),
            Event::SdkPresent { api_level, path } => {
                format!("Android SDK platform {} present at {:?}", api_level, path)
            }
            Event::ToolLocated { tool, path } => format!("Found {} at {:?}", tool, path),
            Event::SubprocessStarted { executable, args } => {
                format!("Running {:?} {}", executable, args.join(" "))
            }
            Event::SubprocessOutput { line, .. } => line.clone(),
            Event::PromptAnswered { executable } => {
                format!("Answered confirmation prompt from {:?}", executable)
            }
            Event::SubprocessExited { executable, code } => match code {
                Some(code) => format!("{:?} exited with code {}", executable, code),
                None => format!("{:?} exited without an exit code", executable),
            },
            Event::SdkInstalled { api_level, path } => {
                format!("Installed Android SDK platform {} at {:?}", api_level, path)
            }
            Event::Log { message, .. } => message.clone(),
        }
    }
}

/// Receiver of diagnostic events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);

    /// Convenience for free-form messages
    fn log(&self, level: LogLevel, message: String) {
        self.emit(Event::Log { level, message });
    }
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every event received so far
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus that forwards to `tracing` and fans out to subscribers
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn trace_event(event: &Event) {
        let message = event.message();
        match event.level() {
            LogLevel::Trace => trace!("{}", message),
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: Event) {
        Self::trace_event(&event);

        let mut subscribers = self.subscribers.write();
        // Dropped subscriptions are pruned on the next emit
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
