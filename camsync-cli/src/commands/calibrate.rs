//! Implementation of the `calibrate` subcommand.

use super::RunContext;
use crate::error::CliResult;

use camsync_core::external::CrateFfprobeExecutor;
use camsync_core::{BatchReport, CommandBackend, Orchestrator, terminal};

pub fn run_calibrate(ctx: &RunContext) -> CliResult<BatchReport> {
    terminal::print_section("CALIBRATION");
    let backend = CommandBackend::from_tools(&ctx.config.tools);
    let prober = CrateFfprobeExecutor::new();
    let report = Orchestrator::new(&backend, &prober, &ctx.config).calibrate_workspace(&ctx.workspace)?;
    if report.is_empty() {
        terminal::print_warning("No calibration projects found in the synced tree");
    }
    terminal::print_report("Calibration", &report);
    Ok(report)
}
