//! Channel traits — the abstraction over messaging transports.
//!
//! Two directions are modelled separately:
//! - `InboundSource` supplies messages in increasing sequence order (e.g. by
//!   polling the local Messages database).
//! - `Channel` delivers the assistant's replies (e.g. via AppleScript).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// A message read from an inbound source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Monotonically increasing id assigned by the source (e.g. a ROWID)
    pub sequence_id: i64,

    /// Sender identifier (phone number, email)
    pub sender_id: String,

    /// The text content
    pub text: String,
}

/// The outbound delivery trait.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "imessage", "cli").
    fn name(&self) -> &str;

    /// Deliver `text` to `recipient`.
    async fn send(&self, recipient: &str, text: &str) -> std::result::Result<(), ChannelError>;

    /// Health check — can this channel deliver right now?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}

/// The inbound polling trait.
///
/// Results are ordered by ascending `sequence_id` and contain only messages
/// received from other people. Deduplication is the caller's job.
#[async_trait]
pub trait InboundSource: Send + Sync {
    /// Human-readable source name (e.g., "messages_db").
    fn name(&self) -> &str;

    /// Messages after `after` whose text starts with `prefix`.
    async fn fetch_greetings(
        &self,
        after: i64,
        prefix: &str,
    ) -> std::result::Result<Vec<InboundMessage>, ChannelError>;

    /// Messages after `after`, optionally restricted to one sender.
    async fn fetch_messages(
        &self,
        after: i64,
        sender: Option<&str>,
    ) -> std::result::Result<Vec<InboundMessage>, ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_message_serialization() {
        let msg = InboundMessage {
            sequence_id: 42,
            sender_id: "+15551234567".into(),
            text: "Welcome to Series! Text your color to get started: blue".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: InboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
