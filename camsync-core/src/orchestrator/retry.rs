//! Bounded parameter escalation for triangulation.
//!
//! A recoverable triangulation failure loosens the reprojection-error and
//! gap-interpolation thresholds by the policy step and tries again, until
//! the attempt budget or the reprojection-error ceiling is exhausted.

use super::backend::{ReconstructionBackend, ReconstructionStage, StageOutcome};
use super::subproject::SubprojectConfig;
use crate::config::{RetryPolicy, TriangulationConfig};
use crate::error::{CoreError, CoreResult};

/// Loosens both triangulation thresholds by one step.
pub fn escalate(triangulation: &mut TriangulationConfig, policy: &RetryPolicy) {
    triangulation.reproj_error_threshold_triangulation += f64::from(policy.step);
    triangulation.interp_if_gap_smaller_than += policy.step;
}

/// Runs triangulation until it succeeds, escalating `config` after every
/// recoverable failure. Returns the number of attempts made; `config`
/// holds the parameters of the final attempt.
pub fn triangulate_with_retry<B: ReconstructionBackend>(
    backend: &B,
    config: &mut SubprojectConfig,
    policy: &RetryPolicy,
) -> CoreResult<u32> {
    let mut attempt = 1;
    loop {
        match backend.triangulate(config) {
            StageOutcome::Success => return Ok(attempt),
            StageOutcome::Fatal(reason) => {
                return Err(CoreError::StageFailed {
                    stage: ReconstructionStage::Triangulation.to_string(),
                    project: config.project_dir().to_path_buf(),
                    reason,
                });
            }
            StageOutcome::Recoverable(reason) => {
                if attempt >= policy.max_attempts {
                    return Err(CoreError::RetryExhausted {
                        project: config.project_dir().to_path_buf(),
                        attempts: attempt,
                        reason,
                    });
                }

                escalate(&mut config.triangulation, policy);
                let threshold = config.triangulation.reproj_error_threshold_triangulation;
                if threshold > policy.max_reprojection_error_threshold {
                    return Err(CoreError::RetryExhausted {
                        project: config.project_dir().to_path_buf(),
                        attempts: attempt,
                        reason: format!(
                            "{reason}; next reprojection threshold {threshold} exceeds {}",
                            policy.max_reprojection_error_threshold
                        ),
                    });
                }

                log::warn!(
                    "Triangulation attempt {} failed for {}: {}",
                    attempt,
                    config.project_dir().display(),
                    reason
                );
                log::info!(
                    "Retrying with reprojection threshold {} and gap {}",
                    threshold,
                    config.triangulation.interp_if_gap_smaller_than
                );
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterType, PoseEstimationConfig, WorkspaceConfig};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::Path;

    struct ScriptedBackend {
        outcomes: RefCell<VecDeque<StageOutcome>>,
    }

    impl ScriptedBackend {
        fn new(outcomes: Vec<StageOutcome>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
            }
        }
    }

    impl ReconstructionBackend for ScriptedBackend {
        fn calibrate(&self, _: &super::super::subproject::CalibrationProjectConfig) -> StageOutcome {
            StageOutcome::Success
        }
        fn associate(&self, _: &SubprojectConfig) -> StageOutcome {
            StageOutcome::Success
        }
        fn triangulate(&self, _: &SubprojectConfig) -> StageOutcome {
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or(StageOutcome::Success)
        }
        fn filter(&self, _: &SubprojectConfig) -> StageOutcome {
            StageOutcome::Success
        }
    }

    fn config() -> SubprojectConfig {
        SubprojectConfig::build(
            Path::new("/p"),
            30,
            &WorkspaceConfig::default(),
            &PoseEstimationConfig::default(),
            FilterType::Butterworth,
        )
    }

    fn policy(max_attempts: u32, ceiling: f64) -> RetryPolicy {
        RetryPolicy {
            step: 10,
            max_attempts,
            max_reprojection_error_threshold: ceiling,
        }
    }

    #[test]
    fn test_two_failures_escalate_twice() {
        let backend = ScriptedBackend::new(vec![
            StageOutcome::Recoverable("too few points".into()),
            StageOutcome::Recoverable("too few points".into()),
            StageOutcome::Success,
        ]);
        let mut cfg = config();
        let attempts = triangulate_with_retry(&backend, &mut cfg, &policy(5, 100.0)).unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(cfg.triangulation.reproj_error_threshold_triangulation, 35.0);
        assert_eq!(cfg.triangulation.interp_if_gap_smaller_than, 30);
    }

    #[test]
    fn test_attempt_budget_exhausted() {
        let backend = ScriptedBackend::new(vec![StageOutcome::Recoverable("no".into()); 10]);
        let err = triangulate_with_retry(&backend, &mut config(), &policy(3, 1000.0)).unwrap_err();
        assert!(matches!(err, CoreError::RetryExhausted { attempts: 3, .. }));
    }

    #[test]
    fn test_threshold_ceiling_exhausted() {
        let backend = ScriptedBackend::new(vec![StageOutcome::Recoverable("no".into()); 10]);
        let err = triangulate_with_retry(&backend, &mut config(), &policy(10, 30.0)).unwrap_err();
        assert!(matches!(err, CoreError::RetryExhausted { attempts: 2, .. }));
    }

    #[test]
    fn test_fatal_outcome_is_not_retried() {
        let backend = ScriptedBackend::new(vec![
            StageOutcome::Fatal("calibration unreadable".into()),
            StageOutcome::Success,
        ]);
        let err = triangulate_with_retry(&backend, &mut config(), &policy(5, 100.0)).unwrap_err();
        assert!(matches!(err, CoreError::StageFailed { .. }));
        assert_eq!(backend.outcomes.borrow().len(), 1);
    }
}
