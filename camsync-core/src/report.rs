//! Batch run reports.
//!
//! Batch operations never stop at the first failing unit of work. They record
//! what was processed, skipped and failed, and hand the report back.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// A unit of work that failed, with the rendered error.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<Failure>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&mut self, path: &Path) {
        self.processed.push(path.to_path_buf());
    }

    pub fn record_skipped(&mut self, path: &Path) {
        self.skipped.push(path.to_path_buf());
    }

    pub fn record_failed(&mut self, path: &Path, error: &CoreError) {
        log::error!("{}: {}", path.display(), error);
        self.failed.push(Failure {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.processed.extend(other.processed);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed",
            self.processed.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}
