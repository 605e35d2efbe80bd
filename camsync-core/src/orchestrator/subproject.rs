// ============================================================================
// camsync-core/src/orchestrator/subproject.rs
// ============================================================================
//
// SUBPROJECT CONFIGS: What the Reconstruction Stages Receive
//
// A subproject is one camera-set directory of a normalized synchronized tree
// that holds 2D pose output and whose session is calibrated. Every
// (subproject, pose config, filter) triple gets its own `SubprojectConfig`;
// the final version of it is kept as an audit file in `pose-3d`.
//
// KEY COMPONENTS:
// - SubprojectConfig / CalibrationProjectConfig: Collaborator contracts
// - find_subprojects / find_calibration_projects: Workspace discovery
// - resolve_frame_rate: Setting fps, probed fps or 30

// ---- Internal crate imports ----
use crate::artifact::{
    ArtifactPath, CALIBRATION_DIR, CALIBRATION_FILE, POSE_ASSOCIATED_DIR, POSE_3D_DIR, POSE_DIR,
    RAW_DIR, Stage,
};
use crate::config::{
    ButterworthParams, CalibrationConfig, FilterType, FilteringConfig, GaussianParams,
    IntrinsicsConfig, KalmanParams, LoessParams, MedianParams, PersonAssociationConfig,
    PoseEstimationConfig, TriangulationConfig, WorkspaceConfig,
};
use crate::discovery::{list_video_files, walk_dirs};
use crate::error::CoreResult;
use crate::external::FfprobeExecutor;
use crate::utils::get_file_stem_safe;

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

/// Frame rate used when neither the setting nor the footage provides one.
pub const DEFAULT_FRAME_RATE: u32 = 30;

const AUDIT_FILE_PREFIX: &str = "actual_processing_config";

// ============================================================================
// SUBPROJECT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSection {
    pub project_dir: PathBuf,
    /// Empty means every frame.
    pub frame_range: Vec<u64>,
    pub frame_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSection {
    pub pose_framework: String,
    pub pose_model: String,
}

/// Filtering section: the filter run in this pass plus the parameters of
/// every filter family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringSection {
    pub display_figures: bool,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub butterworth: ButterworthParams,
    pub kalman: KalmanParams,
    pub butterworth_on_speed: ButterworthParams,
    pub gaussian: GaussianParams,
    #[serde(rename = "LOESS")]
    pub loess: LoessParams,
    pub median: MedianParams,
}

impl FilteringSection {
    pub fn new(filtering: &FilteringConfig, filter_type: FilterType) -> Self {
        let filters = &filtering.filters;
        Self {
            display_figures: filtering.display_figures,
            filter_type,
            butterworth: filters.butterworth.clone().unwrap_or_default(),
            kalman: filters.kalman.clone().unwrap_or_default(),
            butterworth_on_speed: filters.butterworth_on_speed.clone().unwrap_or_default(),
            gaussian: filters.gaussian.clone().unwrap_or_default(),
            loess: filters.loess.clone().unwrap_or_default(),
            median: filters.median.clone().unwrap_or_default(),
        }
    }
}

/// Configuration handed to association, triangulation and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubprojectConfig {
    pub project: ProjectSection,
    #[serde(rename = "personAssociation")]
    pub person_association: PersonAssociationConfig,
    pub pose: PoseSection,
    pub triangulation: TriangulationConfig,
    pub filtering: FilteringSection,
}

impl SubprojectConfig {
    pub fn build(
        project_dir: &Path,
        frame_rate: u32,
        config: &WorkspaceConfig,
        pose: &PoseEstimationConfig,
        filter_type: FilterType,
    ) -> Self {
        Self {
            project: ProjectSection {
                project_dir: project_dir.to_path_buf(),
                frame_range: Vec::new(),
                frame_rate,
            },
            person_association: PersonAssociationConfig {
                single_person: true,
                ..config.person_association.clone()
            },
            pose: PoseSection {
                pose_framework: pose.pose_framework.clone(),
                pose_model: pose.pose_model.clone(),
            },
            triangulation: config.triangulation.clone(),
            filtering: FilteringSection::new(&config.filtering, filter_type),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project.project_dir
    }

    /// `pose-3d/actual_processing_config_{model}_{filter}.json`
    pub fn audit_path(&self) -> PathBuf {
        audit_path(
            self.project_dir(),
            &self.pose.pose_model,
            self.filtering.filter_type,
        )
    }
}

pub fn audit_path(project_dir: &Path, pose_model: &str, filter: FilterType) -> PathBuf {
    project_dir
        .join(POSE_3D_DIR)
        .join(format!("{AUDIT_FILE_PREFIX}_{pose_model}_{filter}.json"))
}

/// Audit files written for any filter of a pose model, sorted by name.
pub fn audit_files_for_model(project_dir: &Path, pose_model: &str) -> CoreResult<Vec<PathBuf>> {
    let dir = project_dir.join(POSE_3D_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let prefix = format!("{AUDIT_FILE_PREFIX}_{pose_model}_");
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// True when every camera in `raw` already has associated pose output.
pub fn association_complete(project_dir: &Path, pose: &PoseEstimationConfig) -> CoreResult<bool> {
    let associated = project_dir.join(POSE_ASSOCIATED_DIR);
    if !associated.is_dir() {
        return Ok(false);
    }
    let cameras = list_video_files(&project_dir.join(RAW_DIR))?;
    if cameras.is_empty() {
        return Ok(false);
    }
    for video in &cameras {
        let camera = get_file_stem_safe(video)?;
        let folder = format!("{}_{}_json", pose.output_prefix(), camera);
        if !associated.join(folder).exists() {
            return Ok(false);
        }
    }
    Ok(true)
}

// ============================================================================
// CALIBRATION PROJECT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProjectSection {
    pub project_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardExtrinsics {
    pub show_reprojection_error: bool,
    pub extrinsics_extension: String,
    pub extrinsics_corners_nb: [u32; 2],
    pub extrinsics_square_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrinsicsSection {
    pub calculate_extrinsics: bool,
    pub extrinsics_method: String,
    pub board: BoardExtrinsics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateSection {
    pub intrinsics: IntrinsicsConfig,
    pub extrinsics: ExtrinsicsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSection {
    pub calibration_type: String,
    pub calculate: CalculateSection,
}

/// Configuration handed to the calibration stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProjectConfig {
    pub project: CalibrationProjectSection,
    pub calibration: CalibrationSection,
}

impl CalibrationProjectConfig {
    pub fn build(project_dir: &Path, calibration: &CalibrationConfig) -> Self {
        let extrinsics = &calibration.extrinsics;
        Self {
            project: CalibrationProjectSection {
                project_dir: project_dir.to_path_buf(),
            },
            calibration: CalibrationSection {
                calibration_type: "calculate".to_string(),
                calculate: CalculateSection {
                    intrinsics: calibration.intrinsics.clone(),
                    extrinsics: ExtrinsicsSection {
                        calculate_extrinsics: extrinsics.calculate_extrinsics,
                        extrinsics_method: "board".to_string(),
                        board: BoardExtrinsics {
                            show_reprojection_error: extrinsics.show_reprojection_error,
                            extrinsics_extension: extrinsics.extrinsics_extension.clone(),
                            extrinsics_corners_nb: extrinsics.extrinsics_corners_nb,
                            extrinsics_square_size: extrinsics.extrinsics_square_size,
                        },
                    },
                },
            },
        }
    }

    /// `Calibration/Calib_board.toml` inside the project.
    pub fn result_path(&self) -> PathBuf {
        calibration_result_path(&self.project.project_dir)
    }
}

pub fn calibration_result_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CALIBRATION_DIR).join(CALIBRATION_FILE)
}

// ============================================================================
// DISCOVERY
// ============================================================================

fn in_normalized_synced_tree(dir: &Path) -> bool {
    ArtifactPath::parse(dir).is_some_and(|a| a.stage() == Stage::Synced && !a.is_placeholder())
}

/// Calibration file of the session owning `subproject`
/// (`../../Calibration/Calib_board.toml`).
pub fn session_calibration_file(subproject: &Path) -> Option<PathBuf> {
    subproject
        .parent()
        .and_then(Path::parent)
        .map(calibration_result_path)
}

/// Directories that hold `pose` output, lie in a normalized synchronized
/// tree and belong to a calibrated session.
pub fn find_subprojects(workspace: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(walk_dirs(workspace)?
        .into_iter()
        .filter(|dir| dir.join(POSE_DIR).is_dir())
        .filter(|dir| in_normalized_synced_tree(dir))
        .filter(|dir| session_calibration_file(dir).is_some_and(|f| f.exists()))
        .collect())
}

/// Synchronized directories that contain a `Calibration` directory.
pub fn find_calibration_projects(workspace: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(walk_dirs(workspace)?
        .into_iter()
        .filter(|dir| dir.join(CALIBRATION_DIR).is_dir())
        .filter(|dir| in_normalized_synced_tree(dir))
        .collect())
}

/// Frame rate of a subproject: the fps of its setting segment, else the
/// probed rate of its first camera file, else [`DEFAULT_FRAME_RATE`].
pub fn resolve_frame_rate<P: FfprobeExecutor>(subproject: &Path, prober: &P) -> u32 {
    if let Some(fps) = ArtifactPath::parse(subproject)
        .and_then(|a| a.setting())
        .and_then(|s| s.fps)
    {
        return fps;
    }

    let first_video = list_video_files(&subproject.join(RAW_DIR))
        .ok()
        .and_then(|videos| videos.into_iter().next());
    if let Some(video) = first_video {
        match prober.get_video_properties(&video) {
            Ok(props) if props.fps > 0.0 => return props.fps.round() as u32,
            Ok(_) => log::warn!("{} reports no frame rate", video.display()),
            Err(e) => log::warn!("Could not probe {}: {}", video.display(), e),
        }
    }
    DEFAULT_FRAME_RATE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "x")?;
        Ok(())
    }

    #[test]
    fn test_serialized_keys_match_collaborator_contract() -> Result<(), Box<dyn std::error::Error>> {
        let config = SubprojectConfig::build(
            Path::new("/w/s/__synced__/walk/30_1280_720_mp4/camA_camB"),
            30,
            &WorkspaceConfig::default(),
            &PoseEstimationConfig::default(),
            FilterType::Loess,
        );
        let value = serde_json::to_value(&config)?;
        assert_eq!(value["filtering"]["type"], "LOESS");
        assert!(value["filtering"]["LOESS"]["nb_values_used"].is_number());
        assert!(value["personAssociation"]["single_person"].as_bool().unwrap_or(false));
        assert_eq!(value["project"]["frame_rate"], 30);
        assert_eq!(value["pose"]["pose_model"], "BLAZEPOSE");
        Ok(())
    }

    #[test]
    fn test_audit_path_naming() {
        let path = audit_path(Path::new("/p"), "BLAZEPOSE", FilterType::Butterworth);
        assert_eq!(
            path,
            PathBuf::from("/p/pose-3d/actual_processing_config_BLAZEPOSE_butterworth.json")
        );
    }

    #[test]
    fn test_find_subprojects_requires_calibration() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let synced = dir.path().join("s/__synced__/walk");
        touch(&synced.join("30_1280_720_mp4/camA_camB/pose/blaze_camA_json/f.json"))?;
        touch(&synced.join("unset_unset_unset_unset/all_cams/pose/blaze_camA_json/f.json"))?;
        assert!(find_subprojects(dir.path())?.is_empty());

        touch(&synced.join("Calibration/Calib_board.toml"))?;
        let found = find_subprojects(dir.path())?;
        assert_eq!(found, vec![synced.join("30_1280_720_mp4/camA_camB")]);
        Ok(())
    }

    #[test]
    fn test_find_calibration_projects() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("s/original/walk/Calibration/intrinsics/cam1.mp4"))?;
        touch(&dir.path().join("s/__synced__/walk/Calibration/intrinsics/cam1.mp4"))?;
        let found = find_calibration_projects(dir.path())?;
        assert_eq!(found, vec![dir.path().join("s/__synced__/walk")]);
        Ok(())
    }

    #[test]
    fn test_audit_files_for_model_ignores_other_models() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        touch(&audit_path(dir.path(), "BLAZEPOSE", FilterType::Kalman))?;
        touch(&audit_path(dir.path(), "OTHER", FilterType::Kalman))?;
        assert_eq!(audit_files_for_model(dir.path(), "BLAZEPOSE")?.len(), 1);
        Ok(())
    }
}
