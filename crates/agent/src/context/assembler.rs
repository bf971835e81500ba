//! Prompt assembler — decides between the welcome script and a model call,
//! and builds the turn list for the latter.
//!
//! # Determinism
//!
//! Assembly is a pure function of the profile's history and the configured
//! bound: identical inputs always produce identical turn lists.

use seriesai_core::message::{Message, PromptTurn};
use seriesai_core::profile::{ConversationState, UserProfile};
use tracing::debug;

use crate::context::token;
use crate::prompts::SYSTEM_PROMPT;

/// Earliest messages always kept when history exceeds the bound.
pub const HEAD_MESSAGES: usize = 3;

/// What the turn processor should do with the current turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPlan {
    /// First inbound message: reply with the fixed welcome script.
    Welcome,
    /// Continuation: send these turns to the completion endpoint.
    Completion(Vec<PromptTurn>),
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_context_length: usize,
}

impl PromptAssembler {
    pub fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    pub fn max_context_length(&self) -> usize {
        self.max_context_length
    }

    /// Plan the turn for `profile`, whose history already holds the inbound message.
    pub fn plan(&self, profile: &UserProfile) -> TurnPlan {
        match profile.conversation_state() {
            ConversationState::FirstTurn => TurnPlan::Welcome,
            ConversationState::New | ConversationState::Continuing => {
                TurnPlan::Completion(self.assemble(&profile.conversation_history))
            }
        }
    }

    /// System turn followed by the selected history, timestamps stripped.
    pub fn assemble(&self, history: &[Message]) -> Vec<PromptTurn> {
        let selected = self.select_history_indices(history.len());

        let mut turns = Vec::with_capacity(selected.len() + 1);
        turns.push(PromptTurn::system(SYSTEM_PROMPT));
        turns.extend(selected.into_iter().map(|i| history[i].to_turn()));

        debug!(
            history_len = history.len(),
            included = turns.len() - 1,
            estimated_tokens = token::estimate_turns_tokens(&turns),
            "Assembled prompt"
        );

        turns
    }

    /// Indices of the history messages to include, ascending.
    ///
    /// Up to the bound everything is kept. Beyond it, the first
    /// `min(3, bound)` messages are kept followed by the most recent
    /// `bound - head`; everything in between is dropped.
    pub fn select_history_indices(&self, len: usize) -> Vec<usize> {
        let max = self.max_context_length;
        if len <= max {
            return (0..len).collect();
        }

        let head = HEAD_MESSAGES.min(max);
        let tail = max - head;
        let tail_start = len - tail;

        let mut indices: Vec<usize> = (0..head).collect();
        indices.extend((tail_start..len).filter(|&i| i >= head));
        indices
    }
}
