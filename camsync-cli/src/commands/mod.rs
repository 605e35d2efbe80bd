//! Command implementations for the CLI.
//!
//! Each submodule implements one subcommand on top of a [`RunContext`]: the
//! canonical workspace path and its validated configuration.

pub mod calibrate;
pub mod preprocess;
pub mod process;

use crate::error::CliResult;

use camsync_core::external::check_dependency;
use camsync_core::{CoreError, WorkspaceConfig};

use std::path::{Path, PathBuf};

/// Workspace and configuration shared by every subcommand.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub workspace: PathBuf,
    pub config: WorkspaceConfig,
}

impl RunContext {
    /// Resolves the workspace and loads `config_path` (or the workspace's
    /// `config.json`).
    pub fn load(workspace: &Path, config_path: Option<&Path>) -> CliResult<Self> {
        let workspace = resolve_workspace(workspace)?;
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| WorkspaceConfig::default_path(&workspace));
        let config = WorkspaceConfig::load(&config_path)?;
        config.validate()?;
        Ok(Self { workspace, config })
    }
}

/// Canonicalizes the workspace path and checks that it is a directory.
pub fn resolve_workspace(workspace: &Path) -> CliResult<PathBuf> {
    let path = workspace.canonicalize().map_err(|e| {
        CoreError::PathError(format!(
            "Invalid workspace path '{}': {}",
            workspace.display(),
            e
        ))
    })?;
    if !path.is_dir() {
        return Err(CoreError::PathError(format!(
            "Invalid workspace path '{}': not a directory",
            workspace.display()
        )));
    }
    Ok(path)
}

/// Checks for ffmpeg and ffprobe.
pub fn check_media_tools() -> CliResult<()> {
    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;
    log::debug!("External dependency check passed.");
    Ok(())
}
