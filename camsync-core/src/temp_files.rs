//! Temporary file management utilities.
//!
//! Derived artifacts are never written in place: they are produced under a
//! hidden temporary name in the destination directory and renamed over the
//! final path once complete. A crash therefore leaves at most a hidden temp
//! file behind, never a truncated artifact that later runs would treat as done.

use crate::error::{CoreError, CoreResult};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Creates a temporary file with prefix and extension. Auto-deleted when dropped.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!(".{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(temp_file)
}

/// Returns a hidden temporary file path with random suffix. Does not create the file.
pub fn create_temp_file_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    use rand::distributions::Alphanumeric;
    use rand::{Rng, thread_rng};

    let random_suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let filename = format!(".{prefix}_{random_suffix}.{extension}");
    dir.join(filename)
}

/// Temporary sibling path for producing `dest`, keeping its extension so
/// ffmpeg picks the right muxer.
pub fn temp_path_for(dest: &Path) -> CoreResult<PathBuf> {
    let dir = dest.parent().ok_or_else(|| {
        CoreError::PathError(format!("{} has no parent directory", dest.display()))
    })?;
    let stem = dest
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("artifact");
    let extension = dest.extension().and_then(|s| s.to_str()).unwrap_or("tmp");
    Ok(create_temp_file_path(dir, stem, extension))
}

/// Moves a finished temporary file onto its final path.
pub fn commit_temp_file(temp: &Path, dest: &Path) -> CoreResult<()> {
    fs::rename(temp, dest).map_err(|e| {
        log::error!(
            "Failed to move {} to {}: {}",
            temp.display(),
            dest.display(),
            e
        );
        CoreError::Io(e)
    })
}

/// Removes a leftover temporary file, logging instead of failing.
pub fn discard_temp_file(temp: &Path) {
    if temp.exists() {
        if let Err(e) = fs::remove_file(temp) {
            log::warn!("Could not remove temporary file {}: {}", temp.display(), e);
        }
    }
}

/// Writes `contents` to `dest` through a temporary file in the same directory.
pub fn write_atomic(dest: &Path, contents: &[u8]) -> CoreResult<()> {
    let dir = dest.parent().ok_or_else(|| {
        CoreError::PathError(format!("{} has no parent directory", dest.display()))
    })?;
    let mut temp = create_temp_file(dir, "write", "tmp")?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}

/// Copies `src` to `dest` through a temporary file; existing targets are kept.
/// Returns whether a copy was made.
pub fn copy_if_missing(src: &Path, dest: &Path) -> CoreResult<bool> {
    if dest.exists() {
        return Ok(false);
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_path_for(dest)?;
    if let Err(e) = fs::copy(src, &temp) {
        discard_temp_file(&temp);
        return Err(CoreError::Io(e));
    }
    commit_temp_file(&temp, dest)?;
    Ok(true)
}
