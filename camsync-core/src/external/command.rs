//! Execution of external collaborator processes.
//!
//! Collaborators (reconstruction stages, pose estimation) are plain child
//! processes. Their stdout/stderr are read on background threads and
//! forwarded to the logger line by line while the parent polls for exit
//! against the configured timeout.

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Output of a finished collaborator process.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    /// The last few stderr lines joined, for error messages.
    pub fn stderr_tail(&self) -> String {
        let start = self.stderr.len().saturating_sub(STDERR_TAIL_LINES);
        self.stderr[start..].join("\n")
    }
}

/// Logs a command line at debug level.
pub fn log_command(cmd: &Command) {
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    log::debug!(
        "Running command: {} {}",
        cmd.get_program().to_string_lossy(),
        args.join(" ")
    );
}

fn forward_lines<R: Read + Send + 'static>(
    reader: R,
    label: String,
    is_stderr: bool,
) -> thread::JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut lines = Vec::new();
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            if is_stderr {
                log::warn!("[{label}] {line}");
            } else {
                log::debug!("[{label}] {line}");
            }
            lines.push(line);
        }
        lines
    })
}

/// Runs `cmd` to completion, killing it once `timeout` elapses.
///
/// A non-zero exit is not an error here; callers decide what it means.
pub fn run_command(cmd: &mut Command, label: &str, timeout: Option<Duration>) -> CoreResult<CommandOutput> {
    log_command(cmd);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            log::error!("Failed to spawn {}: {}", label, e);
            command_start_error(label, e)
        })?;

    let stdout = child.stdout.take().ok_or_else(|| {
        CoreError::OperationFailed(format!("{label}: stdout was not captured"))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        CoreError::OperationFailed(format!("{label}: stderr was not captured"))
    })?;
    let stdout_handle = forward_lines(stdout, label.to_string(), false);
    let stderr_handle = forward_lines(stderr, label.to_string(), true);

    let status = match timeout {
        Some(timeout) => {
            let start = Instant::now();
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) if start.elapsed() >= timeout => {
                        log::error!("{} exceeded its timeout of {:?}; killing it", label, timeout);
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(CoreError::CommandTimeout(label.to_string(), timeout));
                    }
                    Ok(None) => thread::sleep(Duration::from_millis(100)),
                    Err(e) => return Err(command_wait_error(label, e)),
                }
            }
        }
        None => child.wait().map_err(|e| command_wait_error(label, e))?,
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();

    if !status.success() {
        log::warn!("{} exited with {}", label, status);
    }

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}
