// ============================================================================
// camsync-core/src/orchestrator/backend.rs
// ============================================================================
//
// RECONSTRUCTION BACKEND: Boundary to the External Reconstruction Library
//
// The reconstruction library performs calibration, person association,
// triangulation and filtering. The orchestrator only sees typed outcomes.
//
// KEY COMPONENTS:
// - StageOutcome: Success, recoverable failure or fatal failure of a stage
// - ReconstructionBackend: One method per stage
// - CommandBackend: Runs `{command...} <stage> <config.json>`

// ---- Internal crate imports ----
use super::subproject::{CalibrationProjectConfig, SubprojectConfig};
use crate::config::ToolsConfig;
use crate::error::CoreResult;
use crate::external::run_command;
use crate::temp_files::create_temp_file;

// ---- External crate imports ----
use serde::Serialize;

// ---- Standard library imports ----
use std::fmt;
use std::io::Write;
use std::process::Command;
use std::time::Duration;

/// Outcome of one reconstruction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    /// The stage failed in a way that parameter changes may fix.
    Recoverable(String),
    /// The stage cannot succeed for this subproject.
    Fatal(String),
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success)
    }
}

/// Reconstruction stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionStage {
    Calibration,
    Association,
    Triangulation,
    Filtering,
}

impl ReconstructionStage {
    /// Stage argument passed to the reconstruction command.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconstructionStage::Calibration => "calibration",
            ReconstructionStage::Association => "personAssociation",
            ReconstructionStage::Triangulation => "triangulation",
            ReconstructionStage::Filtering => "filtering",
        }
    }
}

impl fmt::Display for ReconstructionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait ReconstructionBackend {
    fn calibrate(&self, config: &CalibrationProjectConfig) -> StageOutcome;
    fn associate(&self, config: &SubprojectConfig) -> StageOutcome;
    fn triangulate(&self, config: &SubprojectConfig) -> StageOutcome;
    fn filter(&self, config: &SubprojectConfig) -> StageOutcome;
}

/// Backend that hands each stage to an external command.
///
/// The stage configuration is written to a temporary JSON file. Exit status
/// zero is success, any other exit status is recoverable, and failing to
/// run the command at all (or a timeout) is fatal.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandBackend {
    pub fn new(command: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }

    pub fn from_tools(tools: &ToolsConfig) -> Self {
        Self::new(tools.reconstruction_command.clone(), tools.timeout())
    }

    fn run_stage<T: Serialize>(&self, stage: ReconstructionStage, config: &T) -> StageOutcome {
        match self.try_run_stage(stage, config) {
            Ok(outcome) => outcome,
            Err(e) => StageOutcome::Fatal(e.to_string()),
        }
    }

    fn try_run_stage<T: Serialize>(&self, stage: ReconstructionStage, config: &T) -> CoreResult<StageOutcome> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(StageOutcome::Fatal("reconstruction command is empty".to_string()));
        };

        let mut config_file = create_temp_file(&std::env::temp_dir(), "camsync_stage", "json")?;
        config_file.write_all(&serde_json::to_vec_pretty(config)?)?;
        config_file.flush()?;

        let mut cmd = Command::new(program);
        cmd.args(args).arg(stage.as_str()).arg(config_file.path());
        let output = run_command(&mut cmd, stage.as_str(), self.timeout)?;

        if output.status.success() {
            Ok(StageOutcome::Success)
        } else {
            Ok(StageOutcome::Recoverable(format!(
                "{} exited with {}: {}",
                stage,
                output.status,
                output.stderr_tail()
            )))
        }
    }
}

impl ReconstructionBackend for CommandBackend {
    fn calibrate(&self, config: &CalibrationProjectConfig) -> StageOutcome {
        self.run_stage(ReconstructionStage::Calibration, config)
    }

    fn associate(&self, config: &SubprojectConfig) -> StageOutcome {
        self.run_stage(ReconstructionStage::Association, config)
    }

    fn triangulate(&self, config: &SubprojectConfig) -> StageOutcome {
        self.run_stage(ReconstructionStage::Triangulation, config)
    }

    fn filter(&self, config: &SubprojectConfig) -> StageOutcome {
        self.run_stage(ReconstructionStage::Filtering, config)
    }
}
