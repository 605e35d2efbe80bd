// ============================================================================
// camsync-core/src/orchestrator/mod.rs
// ============================================================================
//
// PIPELINE ORCHESTRATOR: Calibration and 3D Reconstruction Passes
//
// Walks the workspace, builds collaborator configs and drives the external
// reconstruction stages. Per subproject and (pose config, filter) pair the
// order is association, triangulation, filtering; only triangulation is
// retried. Completed passes leave an audit file that makes reruns skip them.
//
// KEY COMPONENTS:
// - Orchestrator: Calibration and processing drivers
// - backend: Stage outcome type and the external-command backend
// - subproject: Collaborator config structures and workspace discovery
// - retry: Bounded triangulation escalation

pub mod backend;
pub mod retry;
pub mod subproject;

// ---- Internal crate imports ----
use crate::config::{FilterType, PoseEstimationConfig, WorkspaceConfig};
use crate::error::{CoreError, CoreResult};
use crate::external::FfprobeExecutor;
use crate::report::BatchReport;
use crate::temp_files::write_atomic;

pub use backend::{CommandBackend, ReconstructionBackend, ReconstructionStage, StageOutcome};
pub use retry::{escalate, triangulate_with_retry};
pub use subproject::{
    CalibrationProjectConfig, SubprojectConfig, find_calibration_projects, find_subprojects,
    resolve_frame_rate,
};

use subproject::{association_complete, audit_files_for_model, calibration_result_path};

// ---- Standard library imports ----
use std::fs;
use std::path::Path;

/// Result of one (subproject, pose config, filter) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed { triangulation_attempts: u32 },
    Skipped,
}

pub struct Orchestrator<'a, B: ReconstructionBackend, P: FfprobeExecutor> {
    backend: &'a B,
    prober: &'a P,
    config: &'a WorkspaceConfig,
}

impl<'a, B: ReconstructionBackend, P: FfprobeExecutor> Orchestrator<'a, B, P> {
    pub fn new(backend: &'a B, prober: &'a P, config: &'a WorkspaceConfig) -> Self {
        Self {
            backend,
            prober,
            config,
        }
    }

    // ========================================================================
    // CALIBRATION
    // ========================================================================

    /// Calibrates every calibration project in the workspace. Projects with
    /// an existing result are skipped unless `overwrite` is set.
    pub fn calibrate_workspace(&self, workspace: &Path) -> CoreResult<BatchReport> {
        let mut report = BatchReport::new();
        let projects = find_calibration_projects(workspace)?;
        log::info!("Found {} calibration project(s)", projects.len());

        for project in &projects {
            let result_file = calibration_result_path(project);
            if result_file.exists() && !self.config.calibration.overwrite {
                log::info!("Calibration exists for {}, skipping", project.display());
                report.record_skipped(project);
                continue;
            }
            match self.calibrate_project(project) {
                Ok(()) => report.record_processed(project),
                Err(e) => report.record_failed(project, &e),
            }
        }
        Ok(report)
    }

    pub fn calibrate_project(&self, project: &Path) -> CoreResult<()> {
        let config = CalibrationProjectConfig::build(project, &self.config.calibration);
        log::info!("Calibrating cameras in {}", project.display());

        match self.backend.calibrate(&config) {
            StageOutcome::Success => {
                if !config.result_path().exists() {
                    log::warn!(
                        "Calibration reported success but {} is missing",
                        config.result_path().display()
                    );
                }
                Ok(())
            }
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => {
                Err(CoreError::StageFailed {
                    stage: ReconstructionStage::Calibration.to_string(),
                    project: project.to_path_buf(),
                    reason,
                })
            }
        }
    }

    // ========================================================================
    // PROCESSING
    // ========================================================================

    /// Runs every pending reconstruction pass in the workspace. Failures are
    /// recorded per pass in the report.
    pub fn process_workspace(&self, workspace: &Path) -> CoreResult<BatchReport> {
        let mut report = BatchReport::new();
        let subprojects = find_subprojects(workspace)?;
        log::info!("Found {} subproject(s) to process", subprojects.len());

        for subproject in &subprojects {
            self.process_subproject(subproject, &mut report);
        }
        Ok(report)
    }

    /// Runs every (pose config, filter) pass of one subproject. Each pass is
    /// recorded by its audit file; a failed pass does not stop the others.
    pub fn process_subproject(&self, subproject: &Path, report: &mut BatchReport) {
        let frame_rate = resolve_frame_rate(subproject, self.prober);
        let filters = self.config.filtering.filters.enabled();
        if filters.is_empty() {
            log::warn!("No filters configured; nothing to process in {}", subproject.display());
        }

        for pose in &self.config.pose_estimation_configs {
            for &filter in &filters {
                let audit = subproject::audit_path(subproject, &pose.pose_model, filter);
                match self.run_pass(subproject, frame_rate, pose, filter) {
                    Ok(PassOutcome::Completed { .. }) => report.record_processed(&audit),
                    Ok(PassOutcome::Skipped) => report.record_skipped(&audit),
                    Err(e) => {
                        log::error!(
                            "{} / {} failed for {}: {}",
                            pose.pose_model,
                            filter,
                            subproject.display(),
                            e
                        );
                        report.record_failed(&audit, &e);
                    }
                }
            }
        }
    }

    /// Association, triangulation and filtering for one pass, followed by
    /// the audit file.
    pub fn run_pass(
        &self,
        subproject: &Path,
        frame_rate: u32,
        pose: &PoseEstimationConfig,
        filter: FilterType,
    ) -> CoreResult<PassOutcome> {
        let mut config = SubprojectConfig::build(subproject, frame_rate, self.config, pose, filter);
        let audit = config.audit_path();
        if audit.exists() {
            log::info!("{} exists, skipping pass", audit.display());
            return Ok(PassOutcome::Skipped);
        }
        log::info!(
            "Processing {} with {} / {}",
            subproject.display(),
            pose.pose_model,
            filter
        );

        self.run_association(&config, pose)?;
        let attempts = self.run_triangulation(&mut config)?;
        self.run_filtering(&config);

        if let Some(parent) = audit.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&audit, &serde_json::to_vec_pretty(&config)?)?;
        log::info!("Wrote {}", audit.display());

        Ok(PassOutcome::Completed {
            triangulation_attempts: attempts,
        })
    }

    fn run_association(&self, config: &SubprojectConfig, pose: &PoseEstimationConfig) -> CoreResult<()> {
        if association_complete(config.project_dir(), pose)? {
            log::debug!("Associated poses exist for {}", config.project_dir().display());
            return Ok(());
        }
        match self.backend.associate(config) {
            StageOutcome::Success => Ok(()),
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => {
                Err(CoreError::StageFailed {
                    stage: ReconstructionStage::Association.to_string(),
                    project: config.project_dir().to_path_buf(),
                    reason,
                })
            }
        }
    }

    /// Triangulates with retries, unless an audit for the pose model already
    /// exists; in that case its triangulation parameters are carried over.
    /// Returns the number of attempts made.
    fn run_triangulation(&self, config: &mut SubprojectConfig) -> CoreResult<u32> {
        let existing = audit_files_for_model(config.project_dir(), &config.pose.pose_model)?;
        if let Some(previous) = existing.first() {
            log::info!("Triangulation done previously ({})", previous.display());
            match load_audit(previous) {
                Ok(audit) => config.triangulation = audit.triangulation,
                Err(e) => log::warn!("Could not read {}: {}", previous.display(), e),
            }
            return Ok(0);
        }
        triangulate_with_retry(self.backend, config, &self.config.retry)
    }

    fn run_filtering(&self, config: &SubprojectConfig) {
        match self.backend.filter(config) {
            StageOutcome::Success => {}
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => {
                log::error!(
                    "Filtering with {} failed for {}: {}",
                    config.filtering.filter_type,
                    config.project_dir().display(),
                    reason
                );
            }
        }
    }
}

/// Reads an audit file written by a previous pass.
pub fn load_audit(path: &Path) -> CoreResult<SubprojectConfig> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
