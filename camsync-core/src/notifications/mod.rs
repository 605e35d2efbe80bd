//! Run notifications.
//!
//! Optional push messages sent when a `camsync` run starts, completes or
//! fails, delivered through an ntfy topic.
mod abstraction;
mod ntfy;

pub use abstraction::{NotificationSender, NotificationType, NullNotificationSender, hostname};
pub use ntfy::NtfyNotificationSender;
