//! Domain event system — lets embedders and tests observe turns without
//! parsing logs.
//!
//! Events are published when something interesting happens in the system.
//! Other components can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// The fixed first-turn welcome script
    Welcome,
    /// Generated by the completion endpoint
    Model,
    /// The apology returned when the endpoint failed
    Fallback,
}

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// An inbound message was accepted for a user
    MessageReceived {
        user_id: String,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// A reply was appended to a user's history
    ReplyGenerated {
        user_id: String,
        source: ReplySource,
        history_length: usize,
        timestamp: DateTime<Utc>,
    },

    /// The completion endpoint failed and the turn fell back
    UpstreamFailed {
        user_id: String,
        provider: String,
        status_code: Option<u16>,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A reply could not be delivered to the user
    DeliveryFailed {
        channel: String,
        recipient: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components can subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Truncate `text` to at most `max_chars` characters for log/event previews.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ReplyGenerated {
            user_id: "u1".into(),
            source: ReplySource::Welcome,
            history_length: 2,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ReplyGenerated { user_id, source, .. } => {
                assert_eq!(user_id, "u1");
                assert_eq!(*source, ReplySource::Welcome);
            }
            _ => panic!("Expected ReplyGenerated event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::DeliveryFailed {
            channel: "imessage".into(),
            recipient: "+15550000000".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo…");
    }
}
