//! TurnHandler trait — the entry point collaborators call once per inbound message.

use async_trait::async_trait;

use crate::error::TurnError;

/// Processes one inbound message for one user and returns the reply text.
///
/// Upstream failures never surface here; the only error is malformed input.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn handle_turn(&self, user_id: &str, inbound_text: &str) -> std::result::Result<String, TurnError>;
}
