//! External command execution - shell strings and streamed argv runs.
//!
//! Non-zero exits are data, not errors: both entry points return a structured
//! [`ExecResult`] with the captured output and exit code. Only failures
//! unrelated to process exit (spawn failure, broken pipes) propagate as
//! [`ExecError`].

use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output and exit code of a finished (or dry-run) command.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

/// Execution strategy, selected once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Spawn the process.
    Execute,
    /// Spawn nothing; log one descriptive line and return synthetic success.
    DryRun,
}

/// Single-method progress sink: one human-readable line per call.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);
}

impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn append(&self, line: &str) {
        (**self).append(line);
    }
}

/// A no-op sink for silent operations.
#[derive(Debug, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn append(&self, _line: &str) {}
}

/// Options for [`run_command`].
#[derive(Clone, Copy)]
pub struct RunOptions<'a> {
    pub cwd: Option<&'a Path>,
    pub env: &'a [(String, String)],
    pub mode: ExecMode,
    /// Per-line callback for stdout only.
    pub on_stdout: Option<&'a dyn LogSink>,
    /// Per-line callback for stderr only.
    pub on_stderr: Option<&'a dyn LogSink>,
    /// Unified log: both streams interleaved in order of arrival.
    pub log: Option<&'a dyn LogSink>,
}

impl Default for RunOptions<'_> {
    fn default() -> Self {
        Self {
            cwd: None,
            env: &[],
            mode: ExecMode::Execute,
            on_stdout: None,
            on_stderr: None,
            log: None,
        }
    }
}

impl std::fmt::Debug for RunOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("cwd", &self.cwd)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Run a shell command string to completion, capturing output.
///
/// Non-zero exit is reported through `ExecResult::code`, not as an error.
pub async fn exec_command(command: &str, cwd: Option<&Path>) -> Result<ExecResult, ExecError> {
    let mut cmd = shell_command(command);
    cmd.stdin(Stdio::null());
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    let output = cmd.output().await.map_err(|source| ExecError::Spawn {
        command: command.to_string(),
        source,
    })?;

    Ok(ExecResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        code: output.status.code().unwrap_or(1),
    })
}

/// Run a named executable with an explicit argument list, streaming output
/// line-by-line to the configured sinks.
///
/// Partial lines are buffered across chunk boundaries; a trailing
/// unterminated line is flushed at stream end. The two streams are not
/// globally sequenced against each other.
pub async fn run_command(
    program: &str,
    args: &[String],
    opts: RunOptions<'_>,
) -> Result<ExecResult, ExecError> {
    let rendered = render_command(program, args);

    if opts.mode == ExecMode::DryRun {
        if let Some(log) = opts.log {
            log.append(&format!("DRY RUN: {rendered}"));
        }
        return Ok(ExecResult::default());
    }

    let mut cmd = Command::new(resolve_program(program));
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = opts.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in opts.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        command: rendered,
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (stdout_lines, stderr_lines) = tokio::join!(
        drain_lines(stdout, opts.on_stdout, opts.log),
        drain_lines(stderr, opts.on_stderr, opts.log),
    );

    let status = child.wait().await?;
    Ok(ExecResult {
        stdout: stdout_lines.join("\n"),
        stderr: stderr_lines.join("\n"),
        code: status.code().unwrap_or(0),
    })
}

async fn drain_lines<R: AsyncRead + Unpin>(
    stream: Option<R>,
    per_stream: Option<&dyn LogSink>,
    log: Option<&dyn LogSink>,
) -> Vec<String> {
    let mut collected = Vec::new();
    let Some(stream) = stream else {
        return collected;
    };

    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(sink) = per_stream {
            sink.append(&line);
        }
        if let Some(sink) = log {
            sink.append(&line);
        }
        collected.push(line);
    }
    collected
}

fn render_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

// Well-known npm launchers need their batch suffix on Windows.
#[cfg(windows)]
fn resolve_program(program: &str) -> String {
    match program {
        "npm" => "npm.cmd".to_string(),
        "npx" => "npx.cmd".to_string(),
        _ => program.to_string(),
    }
}

#[cfg(not(windows))]
fn resolve_program(program: &str) -> String {
    program.to_string()
}
