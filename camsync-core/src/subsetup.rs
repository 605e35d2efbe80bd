//! Camera sub-setup generation.
//!
//! For an `all_cams` set with N cameras, every subset of 2 to N-1 cameras is
//! materialized as a sibling directory named after its sorted, underscore
//! joined camera identifiers, holding copies of just those cameras' files.
//! The count grows as the sum of C(N, k), so large rigs produce many copies.

use crate::artifact::{ALL_CAMS, ArtifactPath, POSE_DIR, Stage};
use crate::discovery::{find_dirs_named, find_video_files};
use crate::error::{CoreError, CoreResult};
use crate::report::BatchReport;
use crate::temp_files::copy_if_missing;
use crate::utils::get_file_stem_safe;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Camera count above which generation logs a size warning.
const LARGE_RIG_CAMERAS: usize = 12;

/// All `k`-element combinations of `items`, in lexicographic index order.
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    let n = items.len();
    if k == 0 || k > n {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        result.push(indices.iter().map(|&i| items[i].clone()).collect());

        // Rightmost index that can still advance
        let Some(pos) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
            break;
        };
        indices[pos] += 1;
        for j in pos + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
    result
}

/// Directory name of a sub-setup.
pub fn subsetup_name(cameras: &[String]) -> String {
    let mut sorted = cameras.to_vec();
    sorted.sort();
    sorted.join("_")
}

/// `all_cams` directories in synchronized trees.
pub fn find_all_cams_dirs(workspace: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(find_dirs_named(workspace, ALL_CAMS)?
        .into_iter()
        .filter(|dir| {
            ArtifactPath::parse(dir)
                .is_some_and(|a| a.stage() == Stage::Synced && !a.contains_segment(POSE_DIR))
        })
        .collect())
}

/// Camera files of a set: every video below it outside `pose` output.
fn camera_files(all_cams_dir: &Path) -> CoreResult<Vec<(String, PathBuf)>> {
    find_video_files(all_cams_dir, &[POSE_DIR])?
        .into_iter()
        .map(|file| Ok((get_file_stem_safe(&file)?, file)))
        .collect()
}

/// Generates every sub-setup of one `all_cams` directory.
/// Returns the sub-setup directories that received at least one new file.
pub fn create_subsetups(all_cams_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let files = camera_files(all_cams_dir)?;
    let cameras: Vec<String> = files
        .iter()
        .map(|(camera, _)| camera.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let n = cameras.len();

    if n < 3 {
        log::debug!(
            "{} has {} camera(s); no proper subsets of size >= 2",
            all_cams_dir.display(),
            n
        );
        return Ok(Vec::new());
    }
    if n > LARGE_RIG_CAMERAS {
        log::warn!(
            "{} has {} cameras; sub-setup generation copies every subset and grows exponentially",
            all_cams_dir.display(),
            n
        );
    }

    let mut created = Vec::new();
    for k in (2..n).rev() {
        for combination in combinations(&cameras, k) {
            let name = subsetup_name(&combination);
            let mut wrote_any = false;

            for (camera, file) in &files {
                if !combination.contains(camera) {
                    continue;
                }
                let dest = ArtifactPath::parse(file)
                    .and_then(|a| a.with_camera_set(&name))
                    .ok_or_else(|| {
                        CoreError::PathError(format!(
                            "{} is not inside an '{}' set",
                            file.display(),
                            ALL_CAMS
                        ))
                    })?
                    .to_path();
                wrote_any |= copy_if_missing(file, &dest)?;
            }

            if wrote_any {
                log::debug!("Created sub-setup {}", name);
                if let Some(dir) = all_cams_dir.parent() {
                    created.push(dir.join(&name));
                }
            }
        }
    }
    Ok(created)
}

/// Generates sub-setups for every `all_cams` set of the workspace.
pub fn create_subsetups_in_workspace(workspace: &Path) -> CoreResult<BatchReport> {
    let mut report = BatchReport::new();
    for dir in find_all_cams_dirs(workspace)? {
        match create_subsetups(&dir) {
            Ok(created) if created.is_empty() => report.record_skipped(&dir),
            Ok(created) => {
                log::info!("Created {} sub-setup(s) from {}", created.len(), dir.display());
                report.record_processed(&dir);
            }
            Err(e) => report.record_failed(&dir, &e),
        }
    }
    Ok(report)
}
