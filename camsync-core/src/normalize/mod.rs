// ============================================================================
// camsync-core/src/normalize/mod.rs
// ============================================================================
//
// NORMALIZER: Frame-Rate / Resolution / Format Variants of Synced Footage
//
// Each configured setting turns every synchronized camera file (the ones under
// the `unset_unset_unset_unset` placeholder) into a re-encoded variant stored
// under the setting's own segment. Variants are never upsampled and never
// overwritten.
//
// KEY COMPONENTS:
// - Normalizer: Produces variants using injected ffmpeg/ffprobe seams
// - destination_for: Deterministic variant path for (source, setting)
// - resolution: Geometry and frame-rate rules

pub mod resolution;

// ---- Internal crate imports ----
use crate::artifact::{ALL_CAMS, ArtifactPath, CALIBRATION_DIR, POSE_DIR, RAW_DIR, Stage};
use crate::config::NormalizationSetting;
use crate::discovery::find_video_files;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg_executor::run_ffmpeg;
use crate::external::{FfmpegSpawner, FfprobeExecutor};
use crate::report::BatchReport;
use crate::temp_files::{commit_temp_file, discard_temp_file, temp_path_for};
use crate::utils::format_frame_rate;

pub use resolution::{NormalizationTarget, compute_target_resolution, even_floor};

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;

// ---- Standard library imports ----
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Created(PathBuf),
    /// The variant already existed, or the setting is the placeholder
    Skipped(PathBuf),
}

/// Path of the variant of `source` for `setting`.
pub fn destination_for(source: &Path, setting: &NormalizationSetting) -> CoreResult<PathBuf> {
    ArtifactPath::parse(source)
        .and_then(|a| a.with_setting(setting))
        .map(|a| a.to_path())
        .ok_or_else(|| {
            CoreError::PathError(format!(
                "{} is not an un-normalized synchronized file",
                source.display()
            ))
        })
}

/// Synchronized camera files of full camera sets that have not been
/// normalized yet. Sub-setups are derived from normalized sets instead.
pub fn find_normalization_sources(workspace: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(find_video_files(workspace, &[POSE_DIR, CALIBRATION_DIR])?
        .into_iter()
        .filter(|file| {
            ArtifactPath::parse(file).is_some_and(|a| {
                a.stage() == Stage::Synced
                    && a.is_placeholder()
                    && a.camera_set() == Some(ALL_CAMS)
                    && a.contains_segment(RAW_DIR)
            })
        })
        .collect())
}

/// Produces normalization variants with the given ffmpeg spawner and prober.
pub struct Normalizer<'a, S: FfmpegSpawner, P: FfprobeExecutor> {
    spawner: &'a S,
    prober: &'a P,
    timeout: Option<Duration>,
}

impl<'a, S: FfmpegSpawner, P: FfprobeExecutor> Normalizer<'a, S, P> {
    pub fn new(spawner: &'a S, prober: &'a P, timeout: Option<Duration>) -> Self {
        Self {
            spawner,
            prober,
            timeout,
        }
    }

    /// Produces the variant of one file, or does nothing if it exists.
    ///
    /// A target that would upsample the source removes the variant's
    /// directory and fails with `UpsamplingRejected`.
    pub fn normalize_file(
        &self,
        source: &Path,
        setting: &NormalizationSetting,
    ) -> CoreResult<NormalizeOutcome> {
        if setting.is_placeholder() {
            log::debug!("Unconstrained setting produces no variant of {}", source.display());
            return Ok(NormalizeOutcome::Skipped(source.to_path_buf()));
        }

        let dest = destination_for(source, setting)?;
        if dest.exists() {
            log::debug!("{} already exists", dest.display());
            return Ok(NormalizeOutcome::Skipped(dest));
        }
        let dest_dir = dest.parent().ok_or_else(|| {
            CoreError::PathError(format!("{} has no parent directory", dest.display()))
        })?;

        let props = self.prober.get_video_properties(source)?;
        let target = NormalizationTarget::resolve(&props, setting);

        if let Some(reason) = target.upsampling_violation(&props) {
            if dest_dir.exists() {
                log::warn!("Removing {} after rejected upsampling", dest_dir.display());
                fs::remove_dir_all(dest_dir)?;
            }
            return Err(CoreError::UpsamplingRejected {
                path: source.to_path_buf(),
                reason,
            });
        }

        fs::create_dir_all(dest_dir)?;
        let temp = temp_path_for(&dest)?;
        let (width, height) = target.encoded_size();

        let mut cmd = FfmpegCommand::new();
        cmd.input(source.to_string_lossy().as_ref());
        cmd.arg("-an");
        cmd.arg("-vf").arg(format!(
            "fps={},scale={}:{}",
            format_frame_rate(target.fps),
            width,
            height
        ));
        cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
        cmd.arg("-y");
        cmd.output(temp.to_string_lossy().as_ref());

        log::info!(
            "Normalizing {} -> {}x{} @ {} fps",
            source.display(),
            width,
            height,
            format_frame_rate(target.fps)
        );
        if let Err(e) = run_ffmpeg(
            self.spawner,
            cmd,
            "ffmpeg (normalize)",
            self.timeout,
            Some(props.duration_secs),
        ) {
            discard_temp_file(&temp);
            return Err(e);
        }
        commit_temp_file(&temp, &dest)?;
        Ok(NormalizeOutcome::Created(dest))
    }

    /// Produces every variant for every setting. An upsampling rejection
    /// abandons the rest of that camera set for that setting only.
    pub fn normalize_workspace(
        &self,
        workspace: &Path,
        settings: &[NormalizationSetting],
    ) -> CoreResult<BatchReport> {
        let mut report = BatchReport::new();

        let mut sets: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for source in find_normalization_sources(workspace)? {
            let dir = source.parent().map(Path::to_path_buf).unwrap_or_default();
            sets.entry(dir).or_default().push(source);
        }

        for setting in settings.iter().filter(|s| !s.is_placeholder()) {
            log::info!("Normalizing {} camera set(s) to {}", sets.len(), setting);
            for (dir, files) in &sets {
                for file in files {
                    match self.normalize_file(file, setting) {
                        Ok(NormalizeOutcome::Created(path)) => report.record_processed(&path),
                        Ok(NormalizeOutcome::Skipped(path)) => report.record_skipped(&path),
                        Err(e @ CoreError::UpsamplingRejected { .. }) => {
                            report.record_failed(dir, &e);
                            break;
                        }
                        Err(e) => report.record_failed(file, &e),
                    }
                }
            }
        }

        Ok(report)
    }
}
