// ============================================================================
// camsync-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and Per-Run Log File
//
// One fern dispatcher per run: the console gets Info (Debug with
// `--verbose`), the run's log file always gets Debug with timestamps and
// without terminal escape codes.
//
// KEY COMPONENTS:
// - get_timestamp: "YYYYMMDD_HHMMSS" stamp used in log file names
// - log_file_path: `{log_dir}/camsync_{command}_{timestamp}.log`
// - init_logging: Installs the dispatcher

// ---- Internal crate imports ----
use crate::error::{CliErrorContext, CliResult};

// ---- External crate imports ----
use log::LevelFilter;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn log_file_path(log_dir: &Path, command: &str) -> PathBuf {
    log_dir.join(format!("camsync_{}_{}.log", command, get_timestamp()))
}

pub fn init_logging(verbose: bool, log_file: &Path) -> CliResult<()> {
    let console_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let console = fern::Dispatch::new()
        .level(console_level)
        .format(|out, message, record| match record.level() {
            log::Level::Error | log::Level::Warn => {
                out.finish(format_args!("{}: {}", record.level(), message))
            }
            _ => out.finish(format_args!("{}", message)),
        })
        .chain(std::io::stderr());

    let file = fern::Dispatch::new()
        .level(LevelFilter::Debug)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                strip_ansi_escapes::strip_str(message.to_string())
            ))
        })
        .chain(fern::log_file(log_file).cli_context(format!(
            "Failed to open log file '{}'",
            log_file.display()
        ))?);

    fern::Dispatch::new()
        .level(LevelFilter::Debug)
        .level_for("ureq", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| camsync_core::CoreError::OperationFailed(format!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let path = log_file_path(Path::new("/logs"), "process");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("camsync_process_"));
        assert!(name.ends_with(".log"));
        assert_eq!(get_timestamp().len(), "20240601_123045".len());
    }
}
