//! Tests for loading `config.json` workspace configurations.

use camsync_core::config::{FilterType, WorkspaceConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_full_config_file_parsing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config_content = r#"
{
    "settings": [
        { "fps": null, "resolution": [null, null], "format": null },
        { "fps": 30, "resolution": [720, null], "format": "mp4" }
    ],
    "pose_estimation_configs": [
        { "pose_framework": "mediapipe", "pose_model": "BLAZEPOSE", "model_complexity": 1 }
    ],
    "calibration": {
        "overwrite": true,
        "intrinsics": { "intrinsics_corners_nb": [5, 8], "intrinsics_square_size": 25 }
    },
    "personAssociation": { "tracked_keypoint": "Hip" },
    "triangulation": { "reproj_error_threshold_triangulation": 20, "interp_if_gap_smaller_than": 5 },
    "filtering": {
        "display_figures": false,
        "filters": {
            "butterworth": { "order": 4, "cut_off_frequency": 6 },
            "LOESS": { "nb_values_used": 20 }
        }
    },
    "retry": { "step": 5, "max_attempts": 3, "max_reprojection_error_threshold": 60 }
}
"#;
    fs::write(dir.path().join("config.json"), config_content)?;

    let config = WorkspaceConfig::load_from_workspace(dir.path())?;
    config.validate()?;

    assert_eq!(config.settings.len(), 2);
    assert_eq!(config.active_settings().count(), 1);
    assert_eq!(config.settings[1].segment(), "30_720_unset_mp4");
    assert_eq!(config.pose_estimation_configs[0].model_complexity, 1);
    assert!(config.pose_estimation_configs[0].to_json);
    assert!(config.calibration.overwrite);
    assert_eq!(config.calibration.intrinsics.intrinsics_corners_nb, [5, 8]);
    assert_eq!(config.calibration.intrinsics.intrinsics_extension, "mp4");
    assert_eq!(config.person_association.tracked_keypoint, "Hip");
    assert_eq!(config.triangulation.reproj_error_threshold_triangulation, 20.0);
    assert_eq!(config.triangulation.min_cameras_for_triangulation, 2);
    assert_eq!(
        config.filtering.filters.enabled(),
        vec![FilterType::Butterworth, FilterType::Loess]
    );
    assert_eq!(config.retry.step, 5);
    Ok(())
}

#[test]
fn test_invalid_config_names_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    fs::write(&path, "{ \"settings\": 3 }")?;

    let err = WorkspaceConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("config.json"));
    Ok(())
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(WorkspaceConfig::load_from_workspace(dir.path()).is_err());
}

#[test]
fn test_threshold_ceiling_below_initial_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("config.json"),
        r#"{ "retry": { "max_reprojection_error_threshold": 10 } }"#,
    )?;
    let config = WorkspaceConfig::load_from_workspace(dir.path())?;
    assert!(config.validate().is_err());
    Ok(())
}
