//! Stage configuration sections
//!
//! Defines the user-facing options for the external collaborators: pose
//! estimation, calibration, person association, triangulation and filtering.
//! Field names follow the keys the reconstruction collaborator expects, so the
//! same structures are embedded verbatim into subproject configs.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// POSE ESTIMATION
// ============================================================================

/// Pose framework accepted by the pose estimation driver.
pub const SUPPORTED_POSE_FRAMEWORK: &str = "mediapipe";

/// Pose model accepted by the pose estimation driver.
pub const SUPPORTED_POSE_MODEL: &str = "BLAZEPOSE";

/// One pose-estimation configuration. Each entry produces its own family of
/// subproject passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimationConfig {
    pub pose_framework: String,
    pub pose_model: String,

    #[serde(default)]
    pub to_csv: bool,
    #[serde(default)]
    pub to_h5: bool,
    #[serde(default = "default_true")]
    pub to_json: bool,
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub save_images: bool,
    #[serde(default)]
    pub save_video: bool,

    /// Landmark model complexity (0, 1 or 2)
    #[serde(default = "default_model_complexity")]
    pub model_complexity: u8,
}

fn default_true() -> bool {
    true
}

fn default_model_complexity() -> u8 {
    2
}

impl Default for PoseEstimationConfig {
    fn default() -> Self {
        Self {
            pose_framework: SUPPORTED_POSE_FRAMEWORK.to_string(),
            pose_model: SUPPORTED_POSE_MODEL.to_string(),
            to_csv: false,
            to_h5: false,
            to_json: true,
            display: false,
            save_images: false,
            save_video: false,
            model_complexity: default_model_complexity(),
        }
    }
}

impl PoseEstimationConfig {
    pub fn is_supported(&self) -> bool {
        self.pose_framework == SUPPORTED_POSE_FRAMEWORK && self.pose_model == SUPPORTED_POSE_MODEL
    }

    /// Prefix of the per-camera output folders (`{prefix}_{camera}_json`).
    pub fn output_prefix(&self) -> &'static str {
        "blaze"
    }
}

// ============================================================================
// CALIBRATION
// ============================================================================

/// Calibration options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Recompute even when `Calib_board.toml` already exists
    #[serde(default)]
    pub overwrite: bool,

    #[serde(default)]
    pub intrinsics: IntrinsicsConfig,

    #[serde(default)]
    pub extrinsics: ExtrinsicsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
#[serde(default)]
pub struct IntrinsicsConfig {
    pub overwrite_intrinsics: bool,
    pub show_detection_intrinsics: bool,
    pub intrinsics_extension: String,
    pub extract_every_N_sec: f64,
    pub intrinsics_corners_nb: [u32; 2],
    pub intrinsics_square_size: f64,
}

impl Default for IntrinsicsConfig {
    fn default() -> Self {
        Self {
            overwrite_intrinsics: false,
            show_detection_intrinsics: false,
            intrinsics_extension: "mp4".to_string(),
            extract_every_N_sec: 1.0,
            intrinsics_corners_nb: [4, 7],
            intrinsics_square_size: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrinsicsConfig {
    pub calculate_extrinsics: bool,
    pub show_reprojection_error: bool,
    pub extrinsics_extension: String,
    pub extrinsics_corners_nb: [u32; 2],
    pub extrinsics_square_size: f64,
}

impl Default for ExtrinsicsConfig {
    fn default() -> Self {
        Self {
            calculate_extrinsics: true,
            show_reprojection_error: false,
            extrinsics_extension: "mp4".to_string(),
            extrinsics_corners_nb: [4, 7],
            extrinsics_square_size: 60.0,
        }
    }
}

// ============================================================================
// PERSON ASSOCIATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonAssociationConfig {
    pub single_person: bool,
    pub tracked_keypoint: String,
    pub reproj_error_threshold_association: f64,
    pub likelihood_threshold_association: f64,
}

impl Default for PersonAssociationConfig {
    fn default() -> Self {
        Self {
            single_person: true,
            tracked_keypoint: "Neck".to_string(),
            reproj_error_threshold_association: 20.0,
            likelihood_threshold_association: 0.3,
        }
    }
}

// ============================================================================
// TRIANGULATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
#[serde(default)]
pub struct TriangulationConfig {
    pub reproj_error_threshold_triangulation: f64,
    pub likelihood_threshold_triangulation: f64,
    pub min_cameras_for_triangulation: u32,
    pub interpolation: String,
    pub interp_if_gap_smaller_than: u32,
    pub show_interp_indices: bool,
    pub handle_LR_swap: bool,
    pub undistort_points: bool,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            reproj_error_threshold_triangulation: 15.0,
            likelihood_threshold_triangulation: 0.3,
            min_cameras_for_triangulation: 2,
            interpolation: "cubic".to_string(),
            interp_if_gap_smaller_than: 10,
            show_interp_indices: true,
            handle_LR_swap: false,
            undistort_points: false,
        }
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Filter families understood by the reconstruction collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    #[serde(rename = "butterworth")]
    Butterworth,
    #[serde(rename = "kalman")]
    Kalman,
    #[serde(rename = "butterworth_on_speed")]
    ButterworthOnSpeed,
    #[serde(rename = "gaussian")]
    Gaussian,
    #[serde(rename = "LOESS")]
    Loess,
    #[serde(rename = "median")]
    Median,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Butterworth => "butterworth",
            FilterType::Kalman => "kalman",
            FilterType::ButterworthOnSpeed => "butterworth_on_speed",
            FilterType::Gaussian => "gaussian",
            FilterType::Loess => "LOESS",
            FilterType::Median => "median",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButterworthParams {
    pub order: u32,
    pub cut_off_frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KalmanParams {
    pub trust_ratio: f64,
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianParams {
    pub sigma_kernel: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoessParams {
    pub nb_values_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianParams {
    pub kernel_size: u32,
}

/// Filtering options. Every filter present in `filters` is run as its own
/// pass; the parameters of all filters are forwarded in every pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringConfig {
    #[serde(default)]
    pub display_figures: bool,

    #[serde(default)]
    pub filters: FiltersConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub butterworth: Option<ButterworthParams>,
    #[serde(default)]
    pub kalman: Option<KalmanParams>,
    #[serde(default)]
    pub butterworth_on_speed: Option<ButterworthParams>,
    #[serde(default)]
    pub gaussian: Option<GaussianParams>,
    #[serde(default, rename = "LOESS")]
    pub loess: Option<LoessParams>,
    #[serde(default)]
    pub median: Option<MedianParams>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            butterworth: Some(ButterworthParams::default()),
            kalman: None,
            butterworth_on_speed: None,
            gaussian: None,
            loess: None,
            median: None,
        }
    }
}

impl Default for ButterworthParams {
    fn default() -> Self {
        Self {
            order: 4,
            cut_off_frequency: 6.0,
        }
    }
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            trust_ratio: 100.0,
            smooth: true,
        }
    }
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self { sigma_kernel: 2.0 }
    }
}

impl Default for LoessParams {
    fn default() -> Self {
        Self { nb_values_used: 30 }
    }
}

impl Default for MedianParams {
    fn default() -> Self {
        Self { kernel_size: 9 }
    }
}

impl FiltersConfig {
    /// Filters enabled in this configuration, in a fixed order.
    pub fn enabled(&self) -> Vec<FilterType> {
        let mut enabled = Vec::new();
        if self.butterworth.is_some() {
            enabled.push(FilterType::Butterworth);
        }
        if self.kalman.is_some() {
            enabled.push(FilterType::Kalman);
        }
        if self.butterworth_on_speed.is_some() {
            enabled.push(FilterType::ButterworthOnSpeed);
        }
        if self.gaussian.is_some() {
            enabled.push(FilterType::Gaussian);
        }
        if self.loess.is_some() {
            enabled.push(FilterType::Loess);
        }
        if self.median.is_some() {
            enabled.push(FilterType::Median);
        }
        enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_type_serializes_to_collaborator_names() {
        assert_eq!(serde_json::to_string(&FilterType::Loess).unwrap(), "\"LOESS\"");
        assert_eq!(
            serde_json::to_string(&FilterType::ButterworthOnSpeed).unwrap(),
            "\"butterworth_on_speed\""
        );
    }

    #[test]
    fn test_default_filters_enable_butterworth_only() {
        assert_eq!(FiltersConfig::default().enabled(), vec![FilterType::Butterworth]);
    }

    #[test]
    fn test_explicit_filters_replace_defaults() {
        let json = r#"{"filters": {"kalman": {"trust_ratio": 50, "smooth": false}, "LOESS": {"nb_values_used": 12}}}"#;
        let filtering: FilteringConfig = serde_json::from_str(json).unwrap();
        assert_eq!(filtering.filters.enabled(), vec![FilterType::Kalman, FilterType::Loess]);
    }

    #[test]
    fn test_pose_config_support() {
        assert!(PoseEstimationConfig::default().is_supported());
        let other = PoseEstimationConfig {
            pose_framework: "openpose".to_string(),
            pose_model: "BODY_25".to_string(),
            ..Default::default()
        };
        assert!(!other.is_supported());
    }
}
