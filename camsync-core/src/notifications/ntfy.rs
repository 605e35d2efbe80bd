// ============================================================================
// camsync-core/src/notifications/ntfy.rs
// ============================================================================
//
// NTFY SENDER: Push Notifications Through an ntfy Topic
//
// KEY COMPONENTS:
// - NtfyNotificationSender: Validates a topic URL and publishes to it

// ---- Internal crate imports ----
use super::abstraction::{NotificationSender, NotificationType};
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use ntfy::DispatcherBuilder;
use ntfy::payload::{Payload, Priority as NtfyPriority};

/// Publishes notifications to an ntfy topic using the blocking dispatcher.
///
/// ```rust,no_run
/// use camsync_core::notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
/// use std::path::PathBuf;
///
/// let sender = NtfyNotificationSender::new("https://ntfy.sh/lab_capture").unwrap();
/// sender
///     .send_notification(&NotificationType::RunStarted {
///         command: "preprocess".to_string(),
///         workspace: PathBuf::from("/data/campaign"),
///         hostname: "lab-pc".to_string(),
///     })
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NtfyNotificationSender {
    base_url: String,
    topic: String,
}

impl NtfyNotificationSender {
    /// Accepts `https://host/topic`.
    pub fn new(topic_url: &str) -> CoreResult<Self> {
        let after_scheme = topic_url.strip_prefix("https://").ok_or_else(|| {
            CoreError::NotificationError(format!(
                "Invalid ntfy topic URL '{}': must start with https://",
                topic_url
            ))
        })?;

        let (host, topic) = after_scheme.split_once('/').unwrap_or((after_scheme, ""));
        if host.is_empty() {
            return Err(CoreError::NotificationError(format!(
                "URL '{}' must have a non-empty host",
                topic_url
            )));
        }
        let topic = topic.trim_end_matches('/');
        if topic.is_empty() {
            return Err(CoreError::NotificationError(format!(
                "URL '{}' is missing topic path",
                topic_url
            )));
        }

        Ok(Self {
            base_url: format!("https://{}", host),
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl NotificationSender for NtfyNotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()> {
        let dispatcher = DispatcherBuilder::new(&self.base_url)
            .build_blocking()
            .map_err(|e| {
                CoreError::NotificationError(format!(
                    "Failed to build ntfy dispatcher for {}: {}",
                    self.base_url, e
                ))
            })?;

        let priority = map_priority(notification.get_priority()).unwrap_or_else(|| {
            log::warn!(
                "Invalid ntfy priority value provided: {}",
                notification.get_priority()
            );
            NtfyPriority::Default
        });

        let payload = Payload::new(self.topic.as_str())
            .message(notification.get_message())
            .title(notification.get_title())
            .priority(priority)
            .tags(vec!["camsync".to_string(), notification.tag().to_string()]);

        dispatcher.send(&payload).map_err(|e| {
            CoreError::NotificationError(format!(
                "Failed to send ntfy notification to {}/{}: {}",
                self.base_url, self.topic, e
            ))
        })?;
        log::debug!("Sent ntfy notification: {}", notification.get_title());
        Ok(())
    }
}

/// 1 → Min through 5 → Max.
fn map_priority(p: u8) -> Option<NtfyPriority> {
    match p {
        1 => Some(NtfyPriority::Min),
        2 => Some(NtfyPriority::Low),
        3 => Some(NtfyPriority::Default),
        4 => Some(NtfyPriority::High),
        5 => Some(NtfyPriority::Max),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_url_validation() {
        let sender = NtfyNotificationSender::new("https://ntfy.sh/lab_capture").unwrap();
        assert_eq!(sender.topic(), "lab_capture");

        assert!(NtfyNotificationSender::new("http://ntfy.sh/topic").is_err());
        assert!(NtfyNotificationSender::new("https:///topic").is_err());
        assert!(NtfyNotificationSender::new("https://ntfy.sh").is_err());
        assert!(NtfyNotificationSender::new("https://ntfy.sh/").is_err());
    }

    #[test]
    fn test_priority_mapping() {
        assert!(matches!(map_priority(5), Some(NtfyPriority::Max)));
        assert!(map_priority(0).is_none());
    }
}
