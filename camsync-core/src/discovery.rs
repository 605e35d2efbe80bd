//! Filesystem discovery for workspace trees.
//!
//! All walkers skip hidden entries (names starting with `.`), which keeps
//! temporary artifacts, manifests and lock files out of every result. Results
//! are sorted so batch runs process entries in a stable order.

use crate::classify::is_video_file;
use crate::error::CoreResult;

use std::fs;
use std::path::{Path, PathBuf};

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Lists the non-hidden entries of a directory, split into (dirs, files).
fn read_entries(dir: &Path) -> CoreResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_file() {
            files.push(path);
        }
    }
    dirs.sort();
    files.sort();
    Ok((dirs, files))
}

/// Returns `root` and every non-hidden directory below it.
pub fn walk_dirs(root: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut result = vec![root.to_path_buf()];
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let (dirs, _) = read_entries(&dir)?;
        result.extend(dirs.iter().cloned());
        pending.extend(dirs);
    }
    result.sort();
    Ok(result)
}

/// Lists the regular files directly inside `dir`.
pub fn list_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(read_entries(dir)?.1)
}

/// Lists the video files directly inside `dir`.
pub fn list_video_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(list_files(dir)?
        .into_iter()
        .filter(|p| is_video_file(p))
        .collect())
}

/// Recursively lists every regular file below `root`, not descending into
/// directories whose name is in `excluded_dirs`.
pub fn find_files(root: &Path, excluded_dirs: &[&str]) -> CoreResult<Vec<PathBuf>> {
    let mut result = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let (dirs, files) = read_entries(&dir)?;
        result.extend(files);
        pending.extend(dirs.into_iter().filter(|d| {
            d.file_name()
                .and_then(|n| n.to_str())
                .is_none_or(|n| !excluded_dirs.contains(&n))
        }));
    }
    result.sort();
    Ok(result)
}

/// Recursively lists every video file below `root`, honoring `excluded_dirs`.
pub fn find_video_files(root: &Path, excluded_dirs: &[&str]) -> CoreResult<Vec<PathBuf>> {
    Ok(find_files(root, excluded_dirs)?
        .into_iter()
        .filter(|p| is_video_file(p))
        .collect())
}

/// Finds every directory named `name` at or below `root`.
pub fn find_dirs_named(root: &Path, name: &str) -> CoreResult<Vec<PathBuf>> {
    Ok(walk_dirs(root)?
        .into_iter()
        .filter(|d| d.file_name().and_then(|n| n.to_str()) == Some(name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_find_video_files_skips_hidden_and_excluded() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let raw = dir.path().join("a/raw");
        let pose = dir.path().join("a/pose");
        fs::create_dir_all(&raw)?;
        fs::create_dir_all(&pose)?;
        File::create(raw.join("cam1.mp4"))?;
        File::create(raw.join(".cam2_tmp123.mp4"))?;
        File::create(raw.join("notes.txt"))?;
        File::create(pose.join("overlay.mp4"))?;

        let found = find_video_files(dir.path(), &["pose"])?;
        assert_eq!(found, vec![raw.join("cam1.mp4")]);
        Ok(())
    }

    #[test]
    fn test_find_dirs_named() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("s1/original/raw"))?;
        fs::create_dir_all(dir.path().join("s2/original/t/raw"))?;
        fs::create_dir_all(dir.path().join("s2/original/t/rawish"))?;

        let found = find_dirs_named(dir.path(), "raw")?;
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.ends_with("raw")));
        Ok(())
    }
}
