//! Implementation of the `preprocess` subcommand.
//!
//! Synchronizes every camera set, produces the configured normalization
//! variants, generates sub-setups and runs 2D pose estimation.

use super::{RunContext, check_media_tools};
use crate::cli::PreprocessArgs;
use crate::error::CliResult;

use camsync_core::external::{CrateFfprobeExecutor, SidecarSpawner};
use camsync_core::normalize::find_normalization_sources;
use camsync_core::sync::find_camera_sets;
use camsync_core::{
    BatchReport, CommandPoseEstimator, Normalizer, SyncEngine, create_subsetups_in_workspace,
    estimate_workspace, terminal,
};

use log::info;

pub fn run_preprocess(ctx: &RunContext, args: &PreprocessArgs) -> CliResult<BatchReport> {
    let workspace = ctx.workspace.as_path();
    let config = &ctx.config;
    let timeout = config.tools.timeout();
    let spawner = SidecarSpawner;
    let prober = CrateFfprobeExecutor::new();
    let mut total = BatchReport::new();

    // Pose configs are checked before any footage is touched
    camsync_core::pose::ensure_supported(&config.pose_estimation_configs)?;

    let mut tools_checked = false;

    terminal::print_section("SYNCHRONIZATION");
    if !find_camera_sets(workspace)?.is_empty() {
        check_media_tools()?;
        tools_checked = true;
    }
    let report = SyncEngine::new(&spawner, &prober, timeout).sync_workspace(workspace)?;
    terminal::print_report("Synchronization", &report);
    total.merge(report);

    terminal::print_section("NORMALIZATION");
    let settings: Vec<_> = config.active_settings().cloned().collect();
    if settings.is_empty() {
        info!("No normalization settings configured");
    } else {
        if !tools_checked && !find_normalization_sources(workspace)?.is_empty() {
            check_media_tools()?;
        }
        let report = Normalizer::new(&spawner, &prober, timeout).normalize_workspace(workspace, &settings)?;
        terminal::print_report("Normalization", &report);
        total.merge(report);
    }

    terminal::print_section("SUB-SETUPS");
    let report = create_subsetups_in_workspace(workspace)?;
    terminal::print_report("Sub-setups", &report);
    total.merge(report);

    if args.skip_pose {
        info!("Skipping pose estimation");
    } else {
        terminal::print_section("POSE ESTIMATION");
        let estimator = CommandPoseEstimator::from_tools(&config.tools);
        let report = estimate_workspace(&estimator, workspace, &config.pose_estimation_configs)?;
        terminal::print_report("Pose estimation", &report);
        total.merge(report);
    }

    Ok(total)
}
