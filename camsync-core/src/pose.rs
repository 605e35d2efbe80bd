// ============================================================================
// camsync-core/src/pose.rs
// ============================================================================
//
// POSE ESTIMATION DRIVER: 2D Keypoints for Every Camera File
//
// Runs the external pose estimator on every camera file of every normalized
// camera set, writing one `pose/{prefix}_{camera}_json` folder per camera.
// The estimator creates that folder inside a hidden staging folder; it is
// moved into `pose` once complete.
//
// KEY COMPONENTS:
// - PoseEstimator: Seam for the external estimator
// - CommandPoseEstimator: Estimator running a configured command line
// - estimate_workspace: Batch driver

use crate::artifact::{ArtifactPath, CALIBRATION_DIR, POSE_DIR, RAW_DIR, Stage};
use crate::config::{PoseEstimationConfig, ToolsConfig};
use crate::discovery::{find_dirs_named, list_video_files};
use crate::error::{CoreError, CoreResult};
use crate::external::run_command;
use crate::report::BatchReport;
use crate::temp_files::create_temp_file;
use crate::utils::get_file_stem_safe;

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Runs 2D pose estimation on one video.
///
/// Implementations create `{prefix}_{camera}_json` inside `output_dir`,
/// where the camera is the video's file stem.
pub trait PoseEstimator {
    fn estimate(
        &self,
        video: &Path,
        output_dir: &Path,
        config: &PoseEstimationConfig,
    ) -> CoreResult<()>;
}

/// Request handed to the pose command as a JSON file.
#[derive(Debug, Serialize)]
struct PoseRequest<'a> {
    input_file: &'a Path,
    output_folder: &'a Path,
    pose_framework: &'a str,
    pose_model: &'a str,
    to_csv: bool,
    to_h5: bool,
    to_json: bool,
    display: bool,
    save_images: bool,
    save_video: bool,
    model_complexity: u8,
}

impl<'a> PoseRequest<'a> {
    /// Keypoints are always exported as JSON; later stages read nothing else.
    fn new(video: &'a Path, output_folder: &'a Path, config: &'a PoseEstimationConfig) -> Self {
        Self {
            input_file: video,
            output_folder,
            pose_framework: &config.pose_framework,
            pose_model: &config.pose_model,
            to_csv: config.to_csv,
            to_h5: config.to_h5,
            to_json: true,
            display: config.display,
            save_images: config.save_images,
            save_video: config.save_video,
            model_complexity: config.model_complexity,
        }
    }
}

/// Pose estimator invoked as `{command...} <request.json>`.
#[derive(Debug, Clone)]
pub struct CommandPoseEstimator {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandPoseEstimator {
    pub fn new(command: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }

    pub fn from_tools(tools: &ToolsConfig) -> Self {
        Self::new(tools.pose_command.clone(), tools.timeout())
    }
}

impl PoseEstimator for CommandPoseEstimator {
    fn estimate(
        &self,
        video: &Path,
        output_dir: &Path,
        config: &PoseEstimationConfig,
    ) -> CoreResult<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| CoreError::Config("pose command is empty".to_string()))?;

        let request = PoseRequest::new(video, output_dir, config);
        let mut request_file = create_temp_file(&std::env::temp_dir(), "camsync_pose", "json")?;
        request_file.write_all(&serde_json::to_vec_pretty(&request)?)?;
        request_file.flush()?;

        let mut cmd = Command::new(program);
        cmd.args(args).arg(request_file.path());
        let output = run_command(&mut cmd, "pose estimation", self.timeout)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CoreError::StageFailed {
                stage: "pose estimation".to_string(),
                project: video.to_path_buf(),
                reason: format!("exit status {}: {}", output.status, output.stderr_tail()),
            })
        }
    }
}

/// Name of the folder holding one camera's 2D keypoints.
pub fn pose_folder_name(config: &PoseEstimationConfig, camera: &str) -> String {
    format!("{}_{}_json", config.output_prefix(), camera)
}

/// Output folder of one camera's 2D keypoints.
pub fn pose_output_dir(task_dir: &Path, config: &PoseEstimationConfig, camera: &str) -> PathBuf {
    task_dir.join(POSE_DIR).join(pose_folder_name(config, camera))
}

/// Camera-set directories (holders of a `raw` directory) in normalized
/// synchronized trees. Calibration footage and the placeholder tree are left out.
pub fn find_pose_tasks(workspace: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(find_dirs_named(workspace, RAW_DIR)?
        .into_iter()
        .filter(|raw| {
            ArtifactPath::parse(raw).is_some_and(|a| {
                a.stage() == Stage::Synced
                    && !a.is_placeholder()
                    && a.setting().is_some()
                    && !a.contains_segment(CALIBRATION_DIR)
                    && !a.contains_segment(POSE_DIR)
            })
        })
        .filter_map(|raw| raw.parent().map(Path::to_path_buf))
        .collect())
}

/// Rejects unsupported pose configurations before any work starts.
pub fn ensure_supported(configs: &[PoseEstimationConfig]) -> CoreResult<()> {
    match configs.iter().find(|c| !c.is_supported()) {
        Some(config) => Err(CoreError::UnsupportedPoseModel {
            framework: config.pose_framework.clone(),
            model: config.pose_model.clone(),
        }),
        None => Ok(()),
    }
}

fn estimate_into<E: PoseEstimator>(
    estimator: &E,
    video: &Path,
    output_dir: &Path,
    config: &PoseEstimationConfig,
) -> CoreResult<()> {
    let parent = output_dir.parent().ok_or_else(|| {
        CoreError::PathError(format!("{} has no parent directory", output_dir.display()))
    })?;
    let name = output_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::PathError(format!("Bad output folder {}", output_dir.display())))?;
    let staging = parent.join(format!(".{name}.partial"));

    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let result = estimator.estimate(video, &staging, config).and_then(|()| {
        let produced = staging.join(name);
        if !produced.is_dir() {
            return Err(CoreError::StageFailed {
                stage: "pose estimation".to_string(),
                project: video.to_path_buf(),
                reason: format!("no {} folder was produced", name),
            });
        }
        fs::rename(&produced, output_dir)?;
        Ok(())
    });

    if let Err(cleanup) = fs::remove_dir_all(&staging) {
        log::warn!("Could not remove {}: {}", staging.display(), cleanup);
    }
    result
}

/// Runs pose estimation for every camera file of every task folder.
///
/// An unsupported pose configuration fails the whole call; failures of
/// single videos are recorded in the report.
pub fn estimate_workspace<E: PoseEstimator>(
    estimator: &E,
    workspace: &Path,
    configs: &[PoseEstimationConfig],
) -> CoreResult<BatchReport> {
    ensure_supported(configs)?;

    let mut report = BatchReport::new();
    let tasks = find_pose_tasks(workspace)?;
    log::info!("Found {} camera set(s) for pose estimation", tasks.len());

    for config in configs {
        for task in &tasks {
            for video in list_video_files(&task.join(RAW_DIR))? {
                let camera = get_file_stem_safe(&video)?;
                let output_dir = pose_output_dir(task, config, &camera);
                if output_dir.exists() {
                    report.record_skipped(&output_dir);
                    continue;
                }
                log::info!("Estimating 2D pose for {}", video.display());
                match estimate_into(estimator, &video, &output_dir, config) {
                    Ok(()) => report.record_processed(&output_dir),
                    Err(e) => report.record_failed(&video, &e),
                }
            }
        }
    }
    Ok(report)
}
