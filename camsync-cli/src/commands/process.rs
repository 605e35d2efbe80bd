//! Implementation of the `process` subcommand: person association,
//! triangulation with bounded retries, and filtering for every subproject.

use super::RunContext;
use crate::error::CliResult;

use camsync_core::external::CrateFfprobeExecutor;
use camsync_core::{BatchReport, CommandBackend, Orchestrator, terminal};

pub fn run_process(ctx: &RunContext) -> CliResult<BatchReport> {
    terminal::print_section("3D RECONSTRUCTION");
    terminal::print_status(
        "Retry policy",
        &format!(
            "step {}, {} attempt(s), reprojection ceiling {}",
            ctx.config.retry.step,
            ctx.config.retry.max_attempts,
            ctx.config.retry.max_reprojection_error_threshold
        ),
        false,
    );

    let backend = CommandBackend::from_tools(&ctx.config.tools);
    let prober = CrateFfprobeExecutor::new();
    let report = Orchestrator::new(&backend, &prober, &ctx.config).process_workspace(&ctx.workspace)?;
    if report.is_empty() {
        terminal::print_warning("No calibrated subprojects with 2D poses found");
    }
    terminal::print_report("Reconstruction", &report);
    Ok(report)
}
