//! Time-bounded invocation of the external introspection utility.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CoreError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of one utility run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Set when a pipe could not be read to the end, so `stdout` or
    /// `stderr` may be truncated.
    pub capture_error: Option<String>,
}

impl ToolOutput {
    /// Output of a run that exited successfully.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Output of a run that exited with a failure status.
    pub fn failed(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Default::default()
        }
    }
}

/// Runs the configured readelf on `path`.
///
/// Returns `Err` only when the utility itself cannot be started. A
/// non-zero exit or an expired timeout is reported through `ToolOutput`.
pub fn run_readelf(config: &Config, path: &Path) -> Result<ToolOutput> {
    let mut command = Command::new(&config.readelf);
    command
        .args(&config.readelf_args)
        .arg(path)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(
        tool = %config.readelf.display(),
        path = %path.display(),
        "running introspection utility"
    );

    let mut child = command.spawn().map_err(|source| CoreError::ToolMissing {
        tool: config.readelf.clone(),
        source,
    })?;

    // Pipes are drained on their own threads so a large dump cannot stall
    // the child while we poll for its exit.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let timeout = config.timeout();
    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                warn!(error = %e, "failed to wait for introspection utility");
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ToolOutput::failed(String::new(), e.to_string()));
            }
        }
    };

    let (stdout, stdout_error) = collect(stdout, "stdout");
    let (stderr, stderr_error) = collect(stderr, "stderr");
    let capture_error = stdout_error.or(stderr_error);
    if let Some(error) = &capture_error {
        warn!(path = %path.display(), %error, "failed to capture introspection output");
    }

    match status {
        Some(status) => Ok(ToolOutput {
            success: status.success(),
            stdout,
            stderr,
            timed_out: false,
            capture_error,
        }),
        None => {
            warn!(
                path = %path.display(),
                secs = config.timeout_secs,
                "introspection utility timed out"
            );
            Ok(ToolOutput {
                success: false,
                stdout,
                stderr: format!(
                    "{}: timed out after {} seconds",
                    config.readelf.display(),
                    config.timeout_secs
                ),
                timed_out: true,
                capture_error,
            })
        }
    }
}

type Captured = (String, Option<io::Error>);

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<Captured> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let error = reader.read_to_end(&mut bytes).err();
        (String::from_utf8_lossy(&bytes).into_owned(), error)
    })
}

/// Text read from one pipe, plus a description of why it may be partial.
fn collect(
    handle: Option<thread::JoinHandle<Captured>>,
    stream: &str,
) -> (String, Option<String>) {
    let Some(handle) = handle else {
        return (String::new(), Some(format!("{stream} was not captured")));
    };
    match handle.join() {
        Ok((text, None)) => (text, None),
        Ok((text, Some(e))) => (text, Some(format!("failed to read {stream}: {e}"))),
        Err(_) => (String::new(), Some(format!("{stream} reader panicked"))),
    }
}
