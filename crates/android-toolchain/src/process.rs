//! Interactive Subprocesses
//!
//! Runs a tool that may stop and ask for confirmation (sdkmanager's license
//! prompts), answering every prompt it prints and reducing the run to
//! pass/fail.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use unity_ci_core::config::AndroidConfig;
use unity_ci_core::events::{Event, EventSink, OutputStream};

/// Host line terminator used between prompt answers
pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Subprocess errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start {executable:?}: {source}")]
    SpawnFailed {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{executable:?} {} exited with code {exit_code}", .args.join(" "))]
    SubprocessFailed {
        executable: PathBuf,
        args: Vec<String>,
        exit_code: i32,
    },
    #[error("IO error talking to {executable:?}: {source}")]
    Io {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A command line plus environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, OsString)>,
}

impl Invocation {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override one variable of the inherited environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Confirmation prompt and the answer written when it shows up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractivePrompt {
    marker: String,
    response: String,
}

impl InteractivePrompt {
    /// `repeats` copies of `token`, each followed by the host line terminator
    pub fn new(marker: impl Into<String>, token: &str, repeats: usize) -> Self {
        let response = (0..repeats)
            .map(|_| format!("{}{}", token, LINE_ENDING))
            .collect();
        Self {
            marker: marker.into(),
            response,
        }
    }

    pub fn from_config(config: &AndroidConfig) -> Self {
        Self::new(
            config.prompt_marker.clone(),
            &config.acceptance_token,
            config.acceptance_repeats,
        )
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn response(&self) -> &str {
        &self.response
    }
}

impl Default for InteractivePrompt {
    fn default() -> Self {
        Self::from_config(&AndroidConfig::default())
    }
}

/// Prompt detection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    AwaitingPrompt,
    Responding,
}

/// Scans output chunks for the prompt marker.
///
/// Chunks accumulate until the marker appears; the caller then answers and
/// calls [`PromptDetector::acknowledge`], which clears the buffer so text
/// already answered cannot trigger a second response.
#[derive(Debug)]
pub struct PromptDetector<'a> {
    marker: &'a str,
    buffer: String,
    state: PromptState,
}

impl<'a> PromptDetector<'a> {
    pub fn new(marker: &'a str) -> Self {
        Self {
            marker,
            buffer: String::new(),
            state: PromptState::AwaitingPrompt,
        }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    /// Add output; `true` means a prompt is waiting for an answer
    pub fn feed(&mut self, chunk: &str) -> bool {
        self.buffer.push_str(chunk);
        if self.state == PromptState::Responding {
            return false;
        }

        if self.buffer.contains(self.marker) {
            self.state = PromptState::Responding;
            return true;
        }

        // Only a marker split across chunks needs older text
        let mut keep_from = self.buffer.len().saturating_sub(self.marker.len());
        while !self.buffer.is_char_boundary(keep_from) {
            keep_from += 1;
        }
        self.buffer.drain(..keep_from);
        false
    }

    /// The answer was written; start looking for the next prompt
    pub fn acknowledge(&mut self) {
        self.buffer.clear();
        self.state = PromptState::AwaitingPrompt;
    }
}

/// Splits a byte stream into lines, keeping the unfinished tail
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line));
        }
        lines
    }

    fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(decode_line(&self.pending))
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Run `invocation` to completion, answering prompts on stdout.
///
/// Exit code 0 and an unknown exit code (killed by a signal) both count as
/// success; any other code is [`ProcessError::SubprocessFailed`].
pub async fn run_interactive(
    invocation: &Invocation,
    prompt: &InteractivePrompt,
    sink: &dyn EventSink,
) -> Result<(), ProcessError> {
    let executable = invocation.executable.as_path();
    let io_error = |source: std::io::Error| ProcessError::Io {
        executable: executable.to_path_buf(),
        source,
    };

    let mut child = Command::new(executable)
        .args(&invocation.args)
        .envs(invocation.env.iter().map(|(key, value)| (key, value)))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::SpawnFailed {
            executable: executable.to_path_buf(),
            source,
        })?;

    sink.emit(Event::SubprocessStarted {
        executable: executable.to_path_buf(),
        args: invocation.args.clone(),
    });

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout_result, stderr_result) = tokio::join!(
        drive_stdout(stdout, stdin, executable, prompt, sink),
        drain_stderr(stderr, sink),
    );
    stdout_result.map_err(io_error)?;
    stderr_result.map_err(io_error)?;

    let status = child.wait().await.map_err(io_error)?;
    let code = status.code();
    sink.emit(Event::SubprocessExited {
        executable: executable.to_path_buf(),
        code,
    });

    match code {
        Some(0) | None => Ok(()),
        Some(exit_code) => Err(ProcessError::SubprocessFailed {
            executable: executable.to_path_buf(),
            args: invocation.args.clone(),
            exit_code,
        }),
    }
}

async fn drive_stdout<R: AsyncRead + Unpin>(
    stdout: Option<R>,
    mut stdin: Option<ChildStdin>,
    executable: &Path,
    prompt: &InteractivePrompt,
    sink: &dyn EventSink,
) -> std::io::Result<()> {
    let Some(mut stdout) = stdout else {
        return Ok(());
    };

    let mut detector = PromptDetector::new(prompt.marker());
    let mut lines = LineBuffer::default();
    let mut buf = [0u8; 4096];

    loop {
        let n = stdout.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        for line in lines.push(&buf[..n]) {
            sink.emit(Event::SubprocessOutput { stream: OutputStream::Stdout, line });
        }

        if detector.feed(&String::from_utf8_lossy(&buf[..n])) {
            answer(&mut stdin, prompt.response()).await?;
            sink.emit(Event::PromptAnswered { executable: executable.to_path_buf() });
            detector.acknowledge();
        }
    }

    if let Some(line) = lines.finish() {
        sink.emit(Event::SubprocessOutput { stream: OutputStream::Stdout, line });
    }

    // Closing stdin lets a tool still waiting on input see EOF
    drop(stdin);
    Ok(())
}

/// Write the prompt answer; a tool that already exited is not an error
async fn answer(stdin: &mut Option<ChildStdin>, response: &str) -> std::io::Result<()> {
    let Some(pipe) = stdin.as_mut() else {
        return Ok(());
    };

    let result = async {
        pipe.write_all(response.as_bytes()).await?;
        pipe.flush().await
    }
    .await;

    match result {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            *stdin = None;
            Ok(())
        }
        other => other,
    }
}

async fn drain_stderr<R: AsyncRead + Unpin>(stderr: Option<R>, sink: &dyn EventSink) -> std::io::Result<()> {
    let Some(stderr) = stderr else {
        return Ok(());
    };

    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        sink.emit(Event::SubprocessOutput {
            stream: OutputStream::Stderr,
            line: decode_line(&line),
        });
    }
    Ok(())
}
