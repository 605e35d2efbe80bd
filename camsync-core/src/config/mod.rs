//! Configuration structures for the camsync-core library.
//!
//! A workspace is configured by a single `config.json` at its root. Every
//! section is optional; missing sections fall back to their `Default` impls,
//! some of which read environment overrides (`CAMSYNC_*`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use camsync_core::config::WorkspaceConfig;
//! use std::path::Path;
//!
//! let config = WorkspaceConfig::load_from_workspace(Path::new("/data/campaign")).unwrap();
//! config.validate().unwrap();
//! for setting in &config.settings {
//!     println!("normalizing to {}", setting);
//! }
//! ```

mod runtime;
mod setting;
mod stages;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

pub use runtime::{RetryPolicy, ToolsConfig};
pub use setting::{NormalizationSetting, PLACEHOLDER_SEGMENT, UNSET, is_valid_format};
pub use stages::{
    ButterworthParams, CalibrationConfig, ExtrinsicsConfig, FilterType, FilteringConfig,
    FiltersConfig, GaussianParams, IntrinsicsConfig, KalmanParams, LoessParams, MedianParams,
    PersonAssociationConfig, PoseEstimationConfig, SUPPORTED_POSE_FRAMEWORK, SUPPORTED_POSE_MODEL,
    TriangulationConfig,
};

/// File name of the workspace configuration.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Main configuration structure, deserialized from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Normalization targets; the placeholder setting is skipped
    #[serde(default)]
    pub settings: Vec<NormalizationSetting>,

    #[serde(default = "default_pose_configs")]
    pub pose_estimation_configs: Vec<PoseEstimationConfig>,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default, rename = "personAssociation")]
    pub person_association: PersonAssociationConfig,

    #[serde(default)]
    pub triangulation: TriangulationConfig,

    #[serde(default)]
    pub filtering: FilteringConfig,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_pose_configs() -> Vec<PoseEstimationConfig> {
    vec![PoseEstimationConfig::default()]
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            settings: Vec::new(),
            pose_estimation_configs: default_pose_configs(),
            calibration: CalibrationConfig::default(),
            person_association: PersonAssociationConfig::default(),
            triangulation: TriangulationConfig::default(),
            filtering: FilteringConfig::default(),
            retry: RetryPolicy::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Loads a configuration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: WorkspaceConfig = serde_json::from_str(&contents).map_err(|e| {
            CoreError::Config(format!("Cannot parse {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `config.json` from the workspace root.
    pub fn load_from_workspace(workspace: &Path) -> CoreResult<Self> {
        Self::load(&Self::default_path(workspace))
    }

    pub fn default_path(workspace: &Path) -> PathBuf {
        workspace.join(CONFIG_FILE_NAME)
    }

    /// Settings that actually produce normalized variants.
    pub fn active_settings(&self) -> impl Iterator<Item = &NormalizationSetting> {
        self.settings.iter().filter(|s| !s.is_placeholder())
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.retry.step == 0 {
            return Err(CoreError::Config("retry.step must be greater than zero".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.max_reprojection_error_threshold
            < self.triangulation.reproj_error_threshold_triangulation
        {
            return Err(CoreError::Config(format!(
                "retry.max_reprojection_error_threshold ({}) is below the initial triangulation threshold ({})",
                self.retry.max_reprojection_error_threshold,
                self.triangulation.reproj_error_threshold_triangulation
            )));
        }
        if self.pose_estimation_configs.is_empty() {
            return Err(CoreError::Config(
                "pose_estimation_configs must contain at least one entry".to_string(),
            ));
        }
        for setting in &self.settings {
            if let Some(format) = setting.format.as_deref() {
                if !is_valid_format(format) {
                    return Err(CoreError::Config(format!(
                        "Setting format '{}' must be a non-empty alphanumeric extension",
                        format
                    )));
                }
            }
            if setting.fps == Some(0) || setting.resolution.contains(&Some(0)) {
                return Err(CoreError::Config(format!(
                    "Setting {} contains a zero value",
                    setting
                )));
            }
        }
        if self.tools.reconstruction_command.is_empty() {
            return Err(CoreError::Config(
                "tools.reconstruction_command must not be empty".to_string(),
            ));
        }
        if self.tools.pose_command.is_empty() {
            return Err(CoreError::Config("tools.pose_command must not be empty".to_string()));
        }
        Ok(())
    }
}
