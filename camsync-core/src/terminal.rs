//! Terminal UI components and styling for camsync.
//!
//! Consistent terminal output through the `log` facade: section headers,
//! key-value status lines, success/error blocks and a progress bar for long
//! transcodes. Color is disabled when `NO_COLOR` is set.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::report::BatchReport;

/// Represents the visual hierarchy levels in the CLI output
#[derive(Debug, Clone, Copy)]
pub enum OutputLevel {
    /// Main sections (===== SECTION =====)
    Section,
    /// Subsections and major operations (» Operation)
    Subsection,
    /// Items under an operation
    Progress,
    /// Key-value status information
    Status,
}

impl OutputLevel {
    fn indent(&self) -> &'static str {
        match self {
            OutputLevel::Section => "",
            OutputLevel::Subsection => "  ",
            OutputLevel::Progress => "    ",
            OutputLevel::Status => "      ",
        }
    }
}

static CURRENT_PROGRESS: LazyLock<Mutex<Option<ProgressBar>>> = LazyLock::new(|| Mutex::new(None));

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", title.to_uppercase().cyan());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print an item at the specified hierarchy level
pub fn print_item(level: OutputLevel, symbol: Option<&str>, text: &str, bold: bool) {
    let indent = level.indent();
    let prefix = symbol.map(|s| format!("{s} ")).unwrap_or_default();
    if should_use_color() && bold {
        info!("{indent}{prefix}{}", style(text).bold());
    } else {
        info!("{indent}{prefix}{text}");
    }
}

/// Print a subsection or processing step
pub fn print_processing(message: &str) {
    info!("");
    print_item(OutputLevel::Subsection, Some("»"), message, true);
}

/// Print a sub-item under a processing step
pub fn print_sub_item(message: &str) {
    print_item(OutputLevel::Progress, None, message, false);
}

/// Print a success message
pub fn print_success(message: &str) {
    info!("");
    if should_use_color() {
        info!("  ✓ {}", message.green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ⚠ {}", message.yellow());
    } else {
        info!("  ⚠ {message}");
    }
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label_width = 15;
    let padding = if label.width() < label_width {
        label_width - label.width()
    } else {
        1
    };
    let indent = OutputLevel::Status.indent();
    let spaces = " ".repeat(padding);

    if should_use_color() && highlight {
        info!("{indent}{label}:{spaces} {}", value.bold());
    } else {
        info!("{indent}{label}:{spaces} {value}");
    }
}

/// Print an error message
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        info!("✗ {}", title.red().bold());
    } else {
        info!("✗ {title}");
    }

    info!("");
    info!("  Message:  {message}");

    if let Some(suggestion_text) = suggestion {
        info!("");
        info!("  Suggestion: {suggestion_text}");
    }

    info!("");
}

/// Print the counts of a batch report and every failure it holds.
pub fn print_report(title: &str, report: &BatchReport) {
    print_processing(title);
    print_status("Processed", &report.processed.len().to_string(), false);
    print_status("Skipped", &report.skipped.len().to_string(), false);
    print_status("Failed", &report.failed.len().to_string(), !report.failed.is_empty());
    for failure in &report.failed {
        let line = format!("{}: {}", failure.path.display(), failure.error);
        if should_use_color() {
            print_sub_item(&line.red().to_string());
        } else {
            print_sub_item(&line);
        }
    }
}

fn init_progress_bar(label: &str, total_secs: f64) -> ProgressBar {
    let pb = ProgressBar::new((total_secs * 1000.0) as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  ⧖ {msg}: {percent:>3}% [{bar:30}] ({elapsed_precise} / {eta_precise})")
    {
        pb.set_style(style.progress_chars("##."));
    }
    pb.set_message(label.to_string());

    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Updates (creating on first call) the progress bar of the running transcode.
pub fn print_progress_bar(label: &str, elapsed_secs: f64, total_secs: f64) {
    if !std::io::stderr().is_terminal() || total_secs <= 0.0 {
        return;
    }
    if let Ok(mut current) = CURRENT_PROGRESS.lock() {
        let pb = current.get_or_insert_with(|| init_progress_bar(label, total_secs));
        pb.set_position((elapsed_secs * 1000.0) as u64);
    }
}

/// Clear the current progress bar
pub fn clear_progress_bar() {
    if let Ok(mut current) = CURRENT_PROGRESS.lock() {
        if let Some(pb) = current.take() {
            pb.finish_and_clear();
        }
    }
}
