// camsync-core/tests/orchestrator_tests.rs
//
// Orchestrator tests with a scripted reconstruction backend.

use camsync_core::config::{FilterType, FiltersConfig, KalmanParams, WorkspaceConfig};
use camsync_core::external::mocks::MockFfprobeExecutor;
use camsync_core::orchestrator::subproject::{CalibrationProjectConfig, audit_path};
use camsync_core::orchestrator::{
    Orchestrator, ReconstructionBackend, StageOutcome, load_audit, triangulate_with_retry,
};
use camsync_core::{CoreError, SubprojectConfig};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct ScriptedBackend {
    triangulation: RefCell<VecDeque<StageOutcome>>,
    filtering: RefCell<VecDeque<StageOutcome>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedBackend {
    fn with_triangulation(outcomes: Vec<StageOutcome>) -> Self {
        Self {
            triangulation: RefCell::new(outcomes.into()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ReconstructionBackend for ScriptedBackend {
    fn calibrate(&self, config: &CalibrationProjectConfig) -> StageOutcome {
        self.calls.borrow_mut().push("calibrate".to_string());
        let result = config.result_path();
        if let Some(dir) = result.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = fs::write(result, "[cam1]");
        StageOutcome::Success
    }

    fn associate(&self, _: &SubprojectConfig) -> StageOutcome {
        self.calls.borrow_mut().push("associate".to_string());
        StageOutcome::Success
    }

    fn triangulate(&self, _: &SubprojectConfig) -> StageOutcome {
        self.calls.borrow_mut().push("triangulate".to_string());
        self.triangulation
            .borrow_mut()
            .pop_front()
            .unwrap_or(StageOutcome::Success)
    }

    fn filter(&self, _: &SubprojectConfig) -> StageOutcome {
        self.calls.borrow_mut().push("filter".to_string());
        self.filtering
            .borrow_mut()
            .pop_front()
            .unwrap_or(StageOutcome::Success)
    }
}

/// A calibrated session with one subproject holding 2D poses.
fn make_subproject(root: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let session = root.join("s1/__synced__/walk");
    let calibration = session.join("Calibration");
    fs::create_dir_all(&calibration)?;
    fs::write(calibration.join("Calib_board.toml"), "[cam]")?;

    let subproject = session.join("30_1280_720_mp4/camA_camB");
    fs::create_dir_all(subproject.join("raw"))?;
    fs::write(subproject.join("raw/camA.mp4"), "v")?;
    fs::write(subproject.join("raw/camB.mp4"), "v")?;
    fs::create_dir_all(subproject.join("pose/blaze_camA_json"))?;
    fs::create_dir_all(subproject.join("pose/blaze_camB_json"))?;
    Ok(subproject)
}

#[test]
fn test_two_triangulation_failures_escalate_twice() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    let config = WorkspaceConfig::default();
    let backend = ScriptedBackend::with_triangulation(vec![
        StageOutcome::Recoverable("not enough cameras".into()),
        StageOutcome::Recoverable("not enough cameras".into()),
    ]);
    let prober = MockFfprobeExecutor::new();

    let report = Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;
    assert!(report.is_success());
    assert_eq!(report.processed.len(), 1);

    let audit = load_audit(&audit_path(&subproject, "BLAZEPOSE", FilterType::Butterworth))?;
    let initial = &config.triangulation;
    assert_eq!(
        audit.triangulation.reproj_error_threshold_triangulation,
        initial.reproj_error_threshold_triangulation + 20.0
    );
    assert_eq!(
        audit.triangulation.interp_if_gap_smaller_than,
        initial.interp_if_gap_smaller_than + 20
    );
    assert_eq!(audit.project.frame_rate, 30);
    assert_eq!(
        backend.calls(),
        vec!["associate", "triangulate", "triangulate", "triangulate", "filter"]
    );
    Ok(())
}

#[test]
fn test_existing_audit_skips_every_stage() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    let audit = audit_path(&subproject, "BLAZEPOSE", FilterType::Butterworth);
    fs::create_dir_all(audit.parent().ok_or("no parent")?)?;
    fs::write(&audit, "{}")?;

    let config = WorkspaceConfig::default();
    let backend = ScriptedBackend::default();
    let prober = MockFfprobeExecutor::new();
    let report = Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;

    assert_eq!(report.skipped, vec![audit]);
    assert!(backend.calls().is_empty());
    Ok(())
}

#[test]
fn test_second_filter_reuses_triangulation() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    let mut config = WorkspaceConfig::default();
    config.filtering.filters = FiltersConfig {
        kalman: Some(KalmanParams::default()),
        ..FiltersConfig::default()
    };
    let backend = ScriptedBackend::with_triangulation(vec![StageOutcome::Recoverable("gap".into())]);
    let prober = MockFfprobeExecutor::new();

    let report = Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;
    assert_eq!(report.processed.len(), 2);

    let kalman = load_audit(&audit_path(&subproject, "BLAZEPOSE", FilterType::Kalman))?;
    assert_eq!(
        kalman.triangulation.reproj_error_threshold_triangulation,
        config.triangulation.reproj_error_threshold_triangulation + 10.0
    );
    let triangulations = backend.calls().iter().filter(|c| *c == "triangulate").count();
    assert_eq!(triangulations, 2);
    Ok(())
}

#[test]
fn test_filtering_failure_still_writes_audit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    let config = WorkspaceConfig::default();
    let backend = ScriptedBackend {
        filtering: RefCell::new(vec![StageOutcome::Recoverable("singular matrix".into())].into()),
        ..Default::default()
    };
    let prober = MockFfprobeExecutor::new();

    let report = Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;
    assert!(report.is_success());
    assert!(audit_path(&subproject, "BLAZEPOSE", FilterType::Butterworth).exists());
    Ok(())
}

#[test]
fn test_retry_budget_exhaustion_fails_subproject() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    let mut config = WorkspaceConfig::default();
    config.retry.max_attempts = 2;
    let backend =
        ScriptedBackend::with_triangulation(vec![StageOutcome::Recoverable("no".into()); 5]);
    let prober = MockFfprobeExecutor::new();

    let orchestrator = Orchestrator::new(&backend, &prober, &config);
    let report = orchestrator.process_workspace(dir.path())?;
    let audit = audit_path(&subproject, "BLAZEPOSE", FilterType::Butterworth);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, audit);
    assert!(!audit.exists());

    let mut scratch = SubprojectConfig::build(
        &subproject,
        30,
        &config,
        &config.pose_estimation_configs[0],
        FilterType::Butterworth,
    );
    let backend = ScriptedBackend::with_triangulation(vec![StageOutcome::Recoverable("no".into()); 5]);
    let err = triangulate_with_retry(&backend, &mut scratch, &config.retry).unwrap_err();
    assert!(matches!(err, CoreError::RetryExhausted { attempts: 2, .. }));
    Ok(())
}

#[test]
fn test_fatal_triangulation_is_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    make_subproject(dir.path())?;
    let config = WorkspaceConfig::default();
    let backend = ScriptedBackend::with_triangulation(vec![StageOutcome::Fatal("corrupt".into())]);
    let prober = MockFfprobeExecutor::new();

    let report = Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(backend.calls(), vec!["associate", "triangulate"]);
    Ok(())
}

#[test]
fn test_failed_pass_does_not_stop_other_filters() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    let mut config = WorkspaceConfig::default();
    config.filtering.filters = FiltersConfig {
        kalman: Some(KalmanParams::default()),
        ..FiltersConfig::default()
    };
    let backend = ScriptedBackend::with_triangulation(vec![StageOutcome::Fatal("timeout".into())]);
    let prober = MockFfprobeExecutor::new();

    let report = Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;

    let butterworth = audit_path(&subproject, "BLAZEPOSE", FilterType::Butterworth);
    let kalman = audit_path(&subproject, "BLAZEPOSE", FilterType::Kalman);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, butterworth);
    assert_eq!(report.processed, vec![kalman.clone()]);
    assert!(!butterworth.exists());
    assert!(kalman.exists());
    assert_eq!(
        backend.calls(),
        vec!["associate", "triangulate", "associate", "triangulate", "filter"]
    );
    Ok(())
}

#[test]
fn test_associated_poses_skip_association() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let subproject = make_subproject(dir.path())?;
    fs::create_dir_all(subproject.join("pose-associated/blaze_camA_json"))?;
    fs::create_dir_all(subproject.join("pose-associated/blaze_camB_json"))?;

    let config = WorkspaceConfig::default();
    let backend = ScriptedBackend::default();
    let prober = MockFfprobeExecutor::new();
    Orchestrator::new(&backend, &prober, &config).process_workspace(dir.path())?;

    assert_eq!(backend.calls(), vec!["triangulate", "filter"]);
    Ok(())
}

#[test]
fn test_calibration_runs_once_unless_overwritten() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("s1/__synced__/walk/Calibration/intrinsics"))?;

    let mut config = WorkspaceConfig::default();
    let backend = ScriptedBackend::default();
    let prober = MockFfprobeExecutor::new();

    let first = Orchestrator::new(&backend, &prober, &config).calibrate_workspace(dir.path())?;
    assert_eq!(first.processed.len(), 1);
    let second = Orchestrator::new(&backend, &prober, &config).calibrate_workspace(dir.path())?;
    assert_eq!(second.skipped.len(), 1);

    config.calibration.overwrite = true;
    let third = Orchestrator::new(&backend, &prober, &config).calibrate_workspace(dir.path())?;
    assert_eq!(third.processed.len(), 1);
    assert_eq!(backend.calls(), vec!["calibrate", "calibrate"]);
    Ok(())
}
