// ============================================================================
// camsync-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: camsync command-line application
//
// Parses arguments, sets up logging, takes the workspace lock, runs the
// requested subcommand and reports the outcome on the console and, when a
// topic is configured, through ntfy.
//
// Exit codes: 0 on success, 1 on a fatal error or when any unit of work
// failed.

use camsync_cli::commands::resolve_workspace;
use camsync_cli::logging::{init_logging, log_file_path};
use camsync_cli::{
    Cli, CliResult, Commands, RunContext, run_calibrate, run_preprocess, run_process,
};
use camsync_core::notifications::{
    NotificationSender, NotificationType, NtfyNotificationSender, NullNotificationSender, hostname,
};
use camsync_core::{BatchReport, CoreError, WorkspaceLock, terminal};

use clap::Parser;
use log::{debug, warn};

use std::fs;
use std::path::Path;
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        // Errors raised before the logger exists go straight to stderr
        if log::max_level() == log::LevelFilter::Off {
            eprintln!("Error: {}", e);
        } else {
            terminal::print_error("Error", &e.to_string(), None);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let command = cli.command.name();
    let workspace = resolve_workspace(&cli.command.workspace_args().workspace)?;

    let log_dir = cli.log_dir.clone().unwrap_or_else(|| workspace.clone());
    fs::create_dir_all(&log_dir).map_err(|e| {
        CoreError::PathError(format!(
            "Failed to create log directory '{}': {}",
            log_dir.display(),
            e
        ))
    })?;
    let log_file = log_file_path(&log_dir, command);
    init_logging(cli.verbose, &log_file)?;

    terminal::print_section(&format!("CAMSYNC {}", command.to_uppercase()));
    terminal::print_status("Workspace", &workspace.display().to_string(), false);
    terminal::print_status("Log file", &log_file.display().to_string(), false);
    debug!("Run started: {}", chrono::Local::now());

    let notifier: Box<dyn NotificationSender> = match cli.ntfy.as_deref() {
        Some(topic) => Box::new(NtfyNotificationSender::new(topic)?),
        None => Box::new(NullNotificationSender),
    };

    let _lock = WorkspaceLock::acquire(&workspace)?;
    let start = Instant::now();
    notify(
        notifier.as_ref(),
        NotificationType::RunStarted {
            command: command.to_string(),
            workspace: workspace.clone(),
            hostname: hostname(),
        },
    );

    match execute(&cli, &workspace) {
        Ok(report) => {
            notify(
                notifier.as_ref(),
                NotificationType::RunComplete {
                    command: command.to_string(),
                    workspace: workspace.clone(),
                    summary: report.to_string(),
                    failures: report.failed.len(),
                    duration: start.elapsed(),
                    hostname: hostname(),
                },
            );
            terminal::print_status(
                "Total time",
                &camsync_core::format_duration(start.elapsed().as_secs_f64()),
                true,
            );
            summarize(&report)
        }
        Err(e) => {
            notify(
                notifier.as_ref(),
                NotificationType::RunError {
                    command: command.to_string(),
                    workspace: workspace.clone(),
                    message: e.to_string(),
                    hostname: hostname(),
                },
            );
            Err(e)
        }
    }
}

fn execute(cli: &Cli, workspace: &Path) -> CliResult<BatchReport> {
    let ctx = RunContext::load(workspace, cli.config.as_deref())?;
    match &cli.command {
        Commands::Preprocess(args) => run_preprocess(&ctx, args),
        Commands::Calibrate(_) => run_calibrate(&ctx),
        Commands::Process(_) => run_process(&ctx),
    }
}

fn summarize(report: &BatchReport) -> CliResult<()> {
    if report.is_success() {
        terminal::print_success(&format!("Run finished: {}", report));
        Ok(())
    } else {
        Err(CoreError::OperationFailed(format!(
            "{} unit(s) of work failed ({})",
            report.failed.len(),
            report
        )))
    }
}

fn notify(sender: &dyn NotificationSender, notification: NotificationType) {
    if let Err(e) = sender.send_notification(&notification) {
        warn!("Failed to send notification: {}", e);
    }
}
