//! Message domain types.
//!
//! These are the core value objects that flow through the entire system:
//! User texts the assistant → Turn processor records it → Provider generates a reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, onboarding rules)
    System,
    /// The end user
    User,
    /// The onboarding assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a user's conversation history.
///
/// Messages are never modified after they are appended to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with an explicit timestamp.
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Create a new user message stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, Utc::now())
    }

    /// Create a new assistant message stamped now.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, Utc::now())
    }

    /// Create a new system message stamped now.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, Utc::now())
    }

    /// The model-facing projection of this message (timestamp dropped).
    pub fn to_turn(&self) -> PromptTurn {
        PromptTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// One `{role, content}` entry of the payload sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTurn {
    pub role: Role,
    pub content: String,
}

impl PromptTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("blue");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "blue");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
    }

    #[test]
    fn prompt_turn_drops_timestamp() {
        let msg = Message::assistant("what's your full name?");
        let json = serde_json::to_value(msg.to_turn()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "what's your full name?"})
        );
    }
}
