//! Completion manifest of a synchronized camera set.
//!
//! The manifest is the last thing written for a set. Its presence means every
//! synchronized file is complete and trimmed to the common duration.

use crate::error::{CoreError, CoreResult};
use crate::temp_files::write_atomic;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the manifest inside a synchronized `raw` directory.
pub const MANIFEST_FILE_NAME: &str = ".camsync-sync.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraAlignment {
    pub file_name: String,
    /// Spike instant in the raw recording
    pub spike_secs: f64,
    /// Duration after trimming at the spike, before the common cut
    pub trimmed_duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncManifest {
    /// RFC 3339 timestamp of completion
    pub created_at: String,
    pub final_duration_secs: f64,
    pub cameras: Vec<CameraAlignment>,
}

impl SyncManifest {
    pub fn new(cameras: Vec<CameraAlignment>, final_duration_secs: f64) -> Self {
        Self {
            created_at: chrono::Local::now().to_rfc3339(),
            final_duration_secs,
            cameras,
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE_NAME)
    }

    /// Reads the manifest of `dir`, if there is one.
    pub fn load(dir: &Path) -> CoreResult<Option<Self>> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let manifest = serde_json::from_str(&contents).map_err(|e| {
            CoreError::OperationFailed(format!("Corrupt sync manifest {}: {}", path.display(), e))
        })?;
        Ok(Some(manifest))
    }

    pub fn write(&self, dir: &Path) -> CoreResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(&Self::path_in(dir), &json)
    }
}
