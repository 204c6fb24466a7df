//! # Notification Sink
//!
//! The ledger emits human-readable success/error events on a broadcast
//! channel; a toast/alert UI subscribes at the other end (out of scope
//! here, the channel is the boundary). Events are best-effort: with no
//! subscriber attached they are simply dropped.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Which part of the engine an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTopic {
    Sale,
    Return,
    Stock,
    Credit,
    Report,
    Sync,
}

/// A human-readable event for the till's toast/alert system.
#[derive(Debug, Clone)]
pub struct Notification {
    pub topic: NotificationTopic,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Fan-out sender shared by all ledger clones.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Notifier { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Emits an event. Send errors (no active subscriber) are ignored.
    pub(crate) fn emit(&self, topic: NotificationTopic, message: impl Into<String>) {
        let notification = Notification {
            topic,
            message: message.into(),
            at: Utc::now(),
        };
        debug!(?topic, message = %notification.message, "Notification");
        let _ = self.tx.send(notification);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.emit(NotificationTopic::Sale, "Sale committed");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, NotificationTopic::Sale);
        assert_eq!(event.message, "Sale committed");
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let notifier = Notifier::new();
        notifier.emit(NotificationTopic::Sync, "nobody listening");
    }
}
