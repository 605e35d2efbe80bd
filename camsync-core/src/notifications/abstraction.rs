// ============================================================================
// camsync-core/src/notifications/abstraction.rs
// ============================================================================
//
// NOTIFICATION ABSTRACTION: Run Events and Senders
//
// KEY COMPONENTS:
// - NotificationType: Run started, completed or failed
// - NotificationSender: Trait implemented by delivery backends
// - NullNotificationSender: Sender that drops every notification

// ---- Internal crate imports ----
use crate::error::CoreResult;
use crate::utils::format_duration;

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// NOTIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone)]
pub enum NotificationType {
    RunStarted {
        /// Subcommand name (`preprocess`, `calibrate`, `process`)
        command: String,
        workspace: PathBuf,
        hostname: String,
    },

    RunComplete {
        command: String,
        workspace: PathBuf,
        /// One-line batch summary, e.g. "4 processed, 1 skipped, 0 failed"
        summary: String,
        /// Number of failed units of work
        failures: usize,
        duration: Duration,
        hostname: String,
    },

    RunError {
        command: String,
        workspace: PathBuf,
        message: String,
        hostname: String,
    },
}

impl NotificationType {
    pub fn get_title(&self) -> String {
        match self {
            NotificationType::RunStarted { command, .. } => format!("camsync {command} started"),
            NotificationType::RunComplete { command, failures: 0, .. } => {
                format!("camsync {command} complete")
            }
            NotificationType::RunComplete { command, .. } => {
                format!("camsync {command} finished with failures")
            }
            NotificationType::RunError { command, .. } => format!("camsync {command} failed"),
        }
    }

    pub fn get_message(&self) -> String {
        match self {
            NotificationType::RunStarted {
                workspace, hostname, ..
            } => format!("Started on {} for {}", hostname, workspace.display()),
            NotificationType::RunComplete {
                workspace,
                summary,
                duration,
                hostname,
                ..
            } => format!(
                "{} on {} in {}: {}",
                workspace.display(),
                hostname,
                format_duration(duration.as_secs_f64()),
                summary
            ),
            NotificationType::RunError {
                workspace,
                message,
                hostname,
                ..
            } => format!("{} on {}: {}", workspace.display(), hostname, message),
        }
    }

    /// Priority from 1 (lowest) to 5 (highest).
    pub fn get_priority(&self) -> u8 {
        match self {
            NotificationType::RunStarted { .. } => 3,
            NotificationType::RunComplete { failures: 0, .. } => 3,
            NotificationType::RunComplete { .. } => 4,
            NotificationType::RunError { .. } => 5,
        }
    }

    /// Tag attached to the pushed message.
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationType::RunStarted { .. } => "start",
            NotificationType::RunComplete { .. } => "complete",
            NotificationType::RunError { .. } => "error",
        }
    }
}

/// Host name reported in notifications (`HOSTNAME`, else "unknown").
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

// ============================================================================
// NOTIFICATION SENDER
// ============================================================================

pub trait NotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()>;
}

/// Sender used when no topic is configured.
#[derive(Debug, Clone, Default)]
pub struct NullNotificationSender;

impl NotificationSender for NullNotificationSender {
    fn send_notification(&self, _notification: &NotificationType) -> CoreResult<()> {
        Ok(())
    }
}
