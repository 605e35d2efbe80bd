//! Runtime configuration: retry policy and external tool settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::utils::*;

/// Bounds the adaptive triangulation retry loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Amount added to both escalated thresholds after a recoverable failure
    pub step: u32,

    /// Total triangulation attempts allowed, including the first one
    pub max_attempts: u32,

    /// The reprojection threshold is never escalated beyond this value
    pub max_reprojection_error_threshold: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            step: get_env_u32("CAMSYNC_RETRY_STEP", 10),
            max_attempts: get_env_u32("CAMSYNC_RETRY_MAX_ATTEMPTS", 5),
            max_reprojection_error_threshold: get_env_f64("CAMSYNC_MAX_REPROJ_THRESHOLD", 100.0),
        }
    }
}

/// Command lines and limits for the external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Reconstruction collaborator; invoked as `{cmd} <stage> <config.json>`
    pub reconstruction_command: Vec<String>,

    /// Pose estimation collaborator; invoked as `{cmd} <options.json>`
    pub pose_command: Vec<String>,

    /// Per-call timeout in seconds for every external process (0 disables)
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            reconstruction_command: get_env_command("CAMSYNC_RECONSTRUCTION_CMD", &["pose2sim-stage"]),
            pose_command: get_env_command("CAMSYNC_POSE_CMD", &["blazepose-extract"]),
            timeout_secs: get_env_u64("CAMSYNC_TOOL_TIMEOUT_SECS", 6 * 3600),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_disables() {
        let tools = ToolsConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(tools.timeout(), None);
    }

    #[test]
    fn test_partial_retry_policy_uses_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
        assert_eq!(policy.max_attempts, 2);
        assert!(policy.step > 0);
    }
}
