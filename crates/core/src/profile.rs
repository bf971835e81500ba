//! User profile — the per-user conversation record.
//!
//! A profile is created lazily on first contact and owns the user's full,
//! append-only conversation history plus the onboarding fields the assistant
//! is meant to collect. The onboarding fields are part of the record shape but
//! nothing in the core writes them yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Where a conversation stands, derived from history length alone.
///
/// Evaluated after the inbound message of the current turn has been appended:
/// a history of exactly one message means this is the user's first message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No messages recorded
    New,
    /// Exactly one message: the first inbound message ever received
    FirstTurn,
    /// Two or more messages
    Continuing,
}

impl ConversationState {
    pub fn from_history_len(len: usize) -> Self {
        match len {
            0 => Self::New,
            1 => Self::FirstTurn,
            _ => Self::Continuing,
        }
    }
}

/// One user's profile and conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable external identifier (phone number, email, session id)
    pub user_id: String,

    /// Ordered, append-only conversation history
    #[serde(default)]
    pub conversation_history: Vec<Message>,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// Updated at the end of every turn
    pub last_updated: DateTime<Utc>,

    // Profile data collected during onboarding
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub three_types_of_people: Option<Vec<String>>,
    #[serde(default)]
    pub who_to_meet: Option<String>,
    #[serde(default)]
    pub more_details: Option<String>,
    #[serde(default)]
    pub selfie_received: bool,

    // Interest profiling
    #[serde(default)]
    pub top_passions: Option<Vec<String>>,
    #[serde(default)]
    pub project_or_hobby: Option<String>,
    #[serde(default)]
    pub skill_to_improve: Option<String>,

    // Details that may surface in conversation
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub current_projects: Option<Vec<String>>,
    #[serde(default)]
    pub goals: Option<Vec<String>>,
    #[serde(default)]
    pub age: Option<u32>,

    #[serde(default)]
    pub communication_preferences: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub interests: Vec<String>,

    /// Timestamp of the most recent inbound user message
    #[serde(default)]
    pub last_message_timestamp: Option<DateTime<Utc>>,

    /// Inbound user messages received, ever
    #[serde(default)]
    pub total_messages: u64,

    #[serde(default)]
    pub onboarding_step: u32,
    #[serde(default)]
    pub onboarding_complete: bool,
}

impl UserProfile {
    /// Create an empty profile for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            conversation_history: Vec::new(),
            created_at: now,
            last_updated: now,
            color: None,
            name: None,
            email: None,
            bio: None,
            three_types_of_people: None,
            who_to_meet: None,
            more_details: None,
            selfie_received: false,
            top_passions: None,
            project_or_hobby: None,
            skill_to_improve: None,
            location: None,
            school: None,
            occupation: None,
            current_projects: None,
            goals: None,
            age: None,
            communication_preferences: serde_json::Map::new(),
            interests: Vec::new(),
            last_message_timestamp: None,
            total_messages: 0,
            onboarding_step: 0,
            onboarding_complete: false,
        }
    }

    /// Append a message, keeping timestamps non-decreasing in append order.
    ///
    /// Returns the timestamp actually recorded.
    pub fn push(&mut self, role: Role, content: impl Into<String>, at: DateTime<Utc>) -> DateTime<Utc> {
        let at = match self.conversation_history.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };
        self.conversation_history.push(Message::new(role, content, at));
        at
    }

    /// Record an inbound user message: bump the counters, then append it.
    pub fn record_inbound(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        self.total_messages += 1;
        let recorded = self.push(Role::User, content, at);
        self.last_message_timestamp = Some(recorded);
    }

    /// Record the assistant's reply and close out the turn.
    pub fn record_reply(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        let recorded = self.push(Role::Assistant, content, at);
        self.last_updated = recorded;
    }

    /// Current conversation state, derived from history length.
    pub fn conversation_state(&self) -> ConversationState {
        ConversationState::from_history_len(self.conversation_history.len())
    }

    /// The last `limit` messages (all of them when `limit` is `None` or 0).
    pub fn recent_history(&self, limit: Option<usize>) -> &[Message] {
        match limit {
            Some(n) if n > 0 && n < self.conversation_history.len() => {
                &self.conversation_history[self.conversation_history.len() - n..]
            }
            _ => &self.conversation_history,
        }
    }

    /// Start the conversation over. Counters and profile fields are kept.
    pub fn reset_conversation(&mut self) {
        self.conversation_history.clear();
        self.onboarding_step = 0;
        self.onboarding_complete = false;
        self.last_updated = Utc::now();
    }

    /// The profile without its conversation history.
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            user_id: self.user_id.clone(),
            created_at: self.created_at,
            last_updated: self.last_updated,
            color: self.color.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            three_types_of_people: self.three_types_of_people.clone(),
            who_to_meet: self.who_to_meet.clone(),
            selfie_received: self.selfie_received,
            interests: self.interests.clone(),
            last_message_timestamp: self.last_message_timestamp,
            total_messages: self.total_messages,
            history_length: self.conversation_history.len(),
            onboarding_step: self.onboarding_step,
            onboarding_complete: self.onboarding_complete,
        }
    }
}

/// Read-only view of a profile for API consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub color: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub three_types_of_people: Option<Vec<String>>,
    pub who_to_meet: Option<String>,
    pub selfie_received: bool,
    pub interests: Vec<String>,
    pub last_message_timestamp: Option<DateTime<Utc>>,
    pub total_messages: u64,
    pub history_length: usize,
    pub onboarding_step: u32,
    pub onboarding_complete: bool,
}
