// ============================================================================
// camsync-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for camsync-core
//
// This module defines the error type used throughout the library. It covers
// filesystem and external-tool failures as well as the domain conditions of the
// pipeline (missing audio, rejected upsampling, exhausted retries).
//
// KEY COMPONENTS:
// - CoreError: Enum of all error conditions
// - CoreResult: Type alias for Result with CoreError
// - Helper functions for creating command errors

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Custom error type for camsync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- System and I/O Errors ----
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Workspace {} is locked by another run ({})", .0.display(), .1)]
    WorkspaceLocked(PathBuf, String),

    // ---- External Command Errors ----
    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, io::Error),

    #[error("Command '{cmd}' failed with status {status}. Stderr: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Command '{0}' timed out after {1:?}")]
    CommandTimeout(String, Duration),

    #[error("Required external command '{0}' not found or failed to execute")]
    DependencyNotFound(String),

    // ---- Media Analysis Errors ----
    #[error("ffprobe output parsing error: {0}")]
    FfprobeParse(String),

    #[error("Video info error: {0}")]
    VideoInfoError(String),

    #[error("{} has no audio track and cannot be synchronized", .0.display())]
    MissingAudio(PathBuf),

    #[error("Refusing to upsample {}: {reason}", .path.display())]
    UpsamplingRejected { path: PathBuf, reason: String },

    // ---- Configuration Errors ----
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Pose model '{model}' of framework '{framework}' is not supported")]
    UnsupportedPoseModel { framework: String, model: String },

    // ---- Orchestration Errors ----
    #[error("{stage} failed for {}: {reason}", .project.display())]
    StageFailed {
        stage: String,
        project: PathBuf,
        reason: String,
    },

    #[error("Triangulation for {} gave up after {attempts} attempt(s): {reason}", .project.display())]
    RetryExhausted {
        project: PathBuf,
        attempts: u32,
        reason: String,
    },

    // ---- Miscellaneous ----
    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Type alias for Result with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Creates a command start error.
pub fn command_start_error(cmd: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), error)
}

/// Creates a command wait error.
pub fn command_wait_error(cmd: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), error)
}

/// Creates a command failed error.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_audio_message_names_file() {
        let err = CoreError::MissingAudio(PathBuf::from("/s/original/raw/cam1.mp4"));
        assert!(err.to_string().contains("cam1.mp4"));
        assert!(err.to_string().contains("no audio"));
    }

    #[test]
    fn test_retry_exhausted_message() {
        let err = CoreError::RetryExhausted {
            project: PathBuf::from("/w/__synced__/t/a/b"),
            attempts: 3,
            reason: "too few cameras".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("too few cameras"));
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
