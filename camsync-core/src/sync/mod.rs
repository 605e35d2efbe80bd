// ============================================================================
// camsync-core/src/sync/mod.rs
// ============================================================================
//
// SYNCHRONIZATION ENGINE: Audio-Spike Alignment of Camera Sets
//
// Cameras in a session start recording at unrelated instants. Every session
// begins with a sharp sound (a clap); its first energy spike in each camera's
// audio marks the common zero. This module trims every camera at its spike,
// cuts all of them to the shortest trimmed duration and writes the result to
// the `__synced__` mirror of the raw directory.
//
// KEY COMPONENTS:
// - SyncEngine: Synchronizes camera sets using injected ffmpeg/ffprobe seams
// - find_camera_sets: Locates `raw` directories holding two or more cameras
// - copy_calibration_files: Mirrors non-camera footage into `__synced__`

pub mod energy;
pub mod manifest;

// ---- Internal crate imports ----
use crate::artifact::{ArtifactPath, ORIGINAL_MARKER, RAW_DIR, Stage};
use crate::discovery::{find_dirs_named, find_files, list_video_files};
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg_executor::{decode_audio_energy, run_ffmpeg};
use crate::external::{FfmpegSpawner, FfprobeExecutor};
use crate::report::BatchReport;
use crate::temp_files::{commit_temp_file, copy_if_missing, discard_temp_file, temp_path_for};
use crate::utils::get_filename_safe;

pub use energy::{find_spike_frame, spike_threshold, spike_time_secs};
pub use manifest::{CameraAlignment, MANIFEST_FILE_NAME, SyncManifest};

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of synchronizing one camera set.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    Synced(SyncManifest),
    Skipped,
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// Finds every `raw` directory under an `original` marker that holds at
/// least two camera files.
pub fn find_camera_sets(workspace: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut sets = Vec::new();
    for dir in find_dirs_named(workspace, RAW_DIR)? {
        let in_original = ArtifactPath::parse(&dir).is_some_and(|a| a.stage() == Stage::Original);
        if !in_original {
            continue;
        }
        let count = list_video_files(&dir)?.len();
        if count >= 2 {
            sets.push(dir);
        } else if count == 1 {
            log::warn!(
                "{} holds a single camera; nothing to synchronize against",
                dir.display()
            );
        }
    }
    Ok(sets)
}

/// The `__synced__` mirror of a directory under `original`.
pub fn synced_mirror(path: &Path) -> CoreResult<PathBuf> {
    ArtifactPath::parse(path)
        .map(|a| a.to_stage(Stage::Synced).to_path())
        .ok_or_else(|| {
            CoreError::PathError(format!(
                "{} is not inside an '{}' directory",
                path.display(),
                ORIGINAL_MARKER
            ))
        })
}

/// Copies every file under each `original` directory that is not part of a
/// synchronized camera set into `__synced__`, keeping existing targets.
/// Returns the number of files copied.
pub fn copy_calibration_files(workspace: &Path, camera_sets: &[PathBuf]) -> CoreResult<usize> {
    let mut copied = 0;
    for original in find_dirs_named(workspace, ORIGINAL_MARKER)? {
        // Only top-level markers; nested `original` dirs are plain segments
        let is_marker = ArtifactPath::parse(&original).is_some_and(|a| a.segments().is_empty());
        if !is_marker {
            continue;
        }
        for file in find_files(&original, &[])? {
            let in_camera_set = file
                .parent()
                .is_some_and(|parent| camera_sets.iter().any(|set| set == parent));
            if in_camera_set {
                continue;
            }
            let dest = synced_mirror(&file)?;
            if copy_if_missing(&file, &dest)? {
                log::debug!("Copied {} -> {}", file.display(), dest.display());
                copied += 1;
            }
        }
    }
    Ok(copied)
}

// ============================================================================
// ENGINE
// ============================================================================

/// Synchronizes camera sets with the given ffmpeg spawner and prober.
pub struct SyncEngine<'a, S: FfmpegSpawner, P: FfprobeExecutor> {
    spawner: &'a S,
    prober: &'a P,
    timeout: Option<Duration>,
}

impl<'a, S: FfmpegSpawner, P: FfprobeExecutor> SyncEngine<'a, S, P> {
    pub fn new(spawner: &'a S, prober: &'a P, timeout: Option<Duration>) -> Self {
        Self {
            spawner,
            prober,
            timeout,
        }
    }

    /// Synchronizes every camera set of the workspace, then mirrors the
    /// remaining footage. A failing set never stops the others.
    pub fn sync_workspace(&self, workspace: &Path) -> CoreResult<BatchReport> {
        let mut report = BatchReport::new();
        let sets = find_camera_sets(workspace)?;
        log::info!("Found {} camera set(s) to synchronize", sets.len());

        for set in &sets {
            match self.sync_camera_set(set) {
                Ok(SetOutcome::Synced(manifest)) => {
                    log::info!(
                        "Synchronized {} camera(s) in {} to {:.3}s",
                        manifest.cameras.len(),
                        set.display(),
                        manifest.final_duration_secs
                    );
                    report.record_processed(set);
                }
                Ok(SetOutcome::Skipped) => report.record_skipped(set),
                Err(e) => report.record_failed(set, &e),
            }
        }

        match copy_calibration_files(workspace, &sets) {
            Ok(0) => {}
            Ok(n) => log::info!("Copied {} calibration/auxiliary file(s) to the synced tree", n),
            Err(e) => report.record_failed(workspace, &e),
        }

        Ok(report)
    }

    /// Synchronizes the cameras of one `raw` directory.
    pub fn sync_camera_set(&self, raw_dir: &Path) -> CoreResult<SetOutcome> {
        let dest_dir = synced_mirror(raw_dir)?;

        if SyncManifest::load(&dest_dir)?.is_some() {
            log::info!("{} is already synchronized", raw_dir.display());
            return Ok(SetOutcome::Skipped);
        }

        let files = list_video_files(raw_dir)?;
        if files.len() < 2 {
            return Err(CoreError::OperationFailed(format!(
                "{} needs at least two camera files, found {}",
                raw_dir.display(),
                files.len()
            )));
        }

        let dests = files
            .iter()
            .map(|f| Ok(dest_dir.join(get_filename_safe(f)?)))
            .collect::<CoreResult<Vec<PathBuf>>>()?;

        // Without a manifest, earlier output may be cut to different lengths
        let existing = dests.iter().filter(|d| d.exists()).count();
        if existing > 0 {
            log::warn!(
                "{} has unfinished synchronized output ({} of {} file(s)); resynchronizing the whole set",
                dest_dir.display(),
                existing,
                dests.len()
            );
        }

        // Every spike is found before anything is written, so a camera
        // without audio leaves no partial output behind.
        let spikes = files
            .iter()
            .map(|f| self.detect_spike(f))
            .collect::<CoreResult<Vec<f64>>>()?;

        fs::create_dir_all(&dest_dir)?;

        let mut cameras = Vec::with_capacity(files.len());
        for ((file, dest), spike) in files.iter().zip(&dests).zip(&spikes) {
            let trimmed = self.trim_at_spike(file, dest, *spike)?;
            cameras.push(CameraAlignment {
                file_name: get_filename_safe(file)?,
                spike_secs: *spike,
                trimmed_duration_secs: trimmed,
            });
        }

        let final_duration = cameras
            .iter()
            .map(|c| c.trimmed_duration_secs)
            .fold(f64::INFINITY, f64::min);
        log::debug!("Common duration for {}: {:.3}s", raw_dir.display(), final_duration);

        for dest in &dests {
            self.cut_to_duration(dest, final_duration)?;
        }

        let manifest = SyncManifest::new(cameras, final_duration);
        manifest.write(&dest_dir)?;
        Ok(SetOutcome::Synced(manifest))
    }

    /// Spike instant of one camera file, in seconds.
    pub fn detect_spike(&self, file: &Path) -> CoreResult<f64> {
        let audio = self
            .prober
            .get_audio_properties(file)?
            .ok_or_else(|| CoreError::MissingAudio(file.to_path_buf()))?;
        let energy = decode_audio_energy(self.spawner, file, &audio, self.timeout)?;
        match find_spike_frame(&energy) {
            Some(frame) => {
                let spike = spike_time_secs(frame, audio.sample_rate);
                log::info!("Spike in {} at {:.3}s", file.display(), spike);
                Ok(spike)
            }
            None => {
                log::warn!("No audio spike found in {}; keeping its start", file.display());
                Ok(0.0)
            }
        }
    }

    fn encode(&self, mut cmd: FfmpegCommand, dest: &Path, label: &str) -> CoreResult<()> {
        let temp = temp_path_for(dest)?;
        cmd.arg("-an");
        cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
        cmd.arg("-y");
        cmd.output(temp.to_string_lossy().as_ref());

        if let Err(e) = run_ffmpeg(self.spawner, cmd, label, self.timeout, None) {
            discard_temp_file(&temp);
            return Err(e);
        }
        commit_temp_file(&temp, dest)
    }

    /// Writes `src` from `spike` onwards, without audio, to `dest` and
    /// returns the resulting duration.
    fn trim_at_spike(&self, src: &Path, dest: &Path, spike: f64) -> CoreResult<f64> {
        let mut cmd = FfmpegCommand::new();
        cmd.arg("-ss").arg(format!("{spike:.6}"));
        cmd.input(src.to_string_lossy().as_ref());
        self.encode(cmd, dest, "ffmpeg (spike trim)")?;

        let duration = self.prober.get_video_properties(dest)?.duration_secs;
        log::debug!("{} lasts {:.3}s after trimming", dest.display(), duration);
        Ok(duration)
    }

    /// Cuts `file` in place to `[0, duration]`.
    fn cut_to_duration(&self, file: &Path, duration: f64) -> CoreResult<()> {
        let mut cmd = FfmpegCommand::new();
        cmd.input(file.to_string_lossy().as_ref());
        cmd.arg("-t").arg(format!("{duration:.6}"));
        self.encode(cmd, file, "ffmpeg (duration cut)")
    }
}
