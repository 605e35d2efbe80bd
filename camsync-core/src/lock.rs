//! Workspace lock.
//!
//! Only one `camsync` run may write to a workspace at a time. The lock is a
//! file created exclusively at the workspace root and removed when the
//! guard is dropped. A lock left behind by a crashed run has to be removed
//! by hand; its contents name the process and start time.

use crate::error::{CoreError, CoreResult};

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const LOCK_FILE_NAME: &str = ".camsync.lock";

#[derive(Debug)]
pub struct WorkspaceLock {
    path: PathBuf,
}

impl WorkspaceLock {
    pub fn acquire(workspace: &Path) -> CoreResult<Self> {
        Self::acquire_with(workspace, |file| {
            writeln!(file, "pid={}", std::process::id())?;
            writeln!(file, "started={}", chrono::Local::now().to_rfc3339())
        })
    }

    /// Creates the lock file and records its holder with `write_holder`.
    /// The file is removed again if recording fails.
    fn acquire_with<F>(workspace: &Path, write_holder: F) -> CoreResult<Self>
    where
        F: FnOnce(&mut fs::File) -> io::Result<()>,
    {
        let path = workspace.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|s| s.trim().replace('\n', ", "))
                    .unwrap_or_else(|_| "unknown holder".to_string());
                return Err(CoreError::WorkspaceLocked(path, holder));
            }
            Err(e) => return Err(e.into()),
        };

        // From here on, dropping the guard removes the file
        let lock = Self { path };
        write_holder(&mut file)?;
        log::debug!("Acquired workspace lock {}", lock.path.display());
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}
