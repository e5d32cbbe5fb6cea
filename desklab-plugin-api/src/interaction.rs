//! User interaction primitives: notifications and confirmations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity of a plugin notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

/// A notification raised by a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginNotification {
    pub message: String,
    pub kind: NotificationKind,
    pub plugin_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Process-wide broadcast channel for plugin notifications
#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<PluginNotification>,
}

impl NotificationBus {
    /// Default broadcast capacity
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to every live subscriber. Returns how many received it.
    pub fn publish(&self, notification: PluginNotification) -> usize {
        // No subscribers is fine
        self.tx.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PluginNotification> {
        self.tx.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Asks the user a yes/no question
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, text: &str) -> bool;
}

/// Answers every confirmation with the same value
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ConfirmPrompt for FixedAnswer {
    async fn confirm(&self, _text: &str) -> bool {
        self.0
    }
}

/// Prompt text for a confirmation, `"<title>\n\n<message>"` when titled
pub fn confirm_text(message: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("{title}\n\n{message}"),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(message: &str) -> PluginNotification {
        PluginNotification {
            message: message.to_string(),
            kind: NotificationKind::default(),
            plugin_id: "p".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = NotificationBus::default();
        assert_eq!(bus.publish(note("hello")), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let bus = NotificationBus::new(4);
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(note("hello")), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "hello");
        assert_eq!(received.kind, NotificationKind::Info);
    }

    #[test]
    fn test_notification_kind_wire_names() {
        let json = serde_json::to_string(&NotificationKind::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn test_confirm_text() {
        assert_eq!(confirm_text("Delete?", None), "Delete?");
        assert_eq!(confirm_text("Delete?", Some("Danger")), "Danger\n\nDelete?");
    }

    #[tokio::test]
    async fn test_fixed_answer() {
        assert!(FixedAnswer(true).confirm("ok?").await);
        assert!(!FixedAnswer(false).confirm("ok?").await);
    }
}
