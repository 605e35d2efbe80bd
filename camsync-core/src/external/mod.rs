// ============================================================================
// camsync-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools
//
// This module encapsulates every process camsync starts: ffmpeg and ffprobe
// for media work, and the reconstruction / pose collaborators. The ffmpeg and
// ffprobe seams are traits so the engines can run against mocks in tests.
//
// KEY COMPONENTS:
// - Traits for external tool interactions (FfmpegSpawner, FfprobeExecutor)
// - Concrete implementations using ffmpeg-sidecar and ffprobe crates
// - A timeout-aware runner for collaborator processes
// - Dependency checking

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Timeout-aware execution of collaborator processes
pub mod command;

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Contains traits and implementations for executing ffprobe commands
pub mod ffprobe_executor;

/// Mock implementations for tests (feature `test-mocks`)
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use command::{CommandOutput, run_command};
pub use ffmpeg_executor::{
    FfmpegProcess, FfmpegSpawner, ProcessEvent, SidecarProcess, SidecarSpawner,
};
pub use ffprobe_executor::{AudioProperties, CrateFfprobeExecutor, FfprobeExecutor, VideoProperties};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `cmd_name -version` and only looks at whether the process could be
/// started.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}
