//! # SeriesAI Core
//!
//! Domain types, traits, and error definitions for the SeriesAI onboarding
//! assistant. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in
//! their respective crates:
//! - `Provider` — remote completion endpoints (`seriesai-providers`)
//! - `ProfileStore` — per-user profile storage (`seriesai-memory`)
//! - `TurnHandler` — the turn state machine (`seriesai-agent`)
//! - `Channel` / `InboundSource` — delivery and polling (`seriesai-channels`)

pub mod agent;
pub mod channel;
pub mod error;
pub mod event;
pub mod message;
pub mod profile;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use agent::TurnHandler;
pub use channel::{Channel, InboundMessage, InboundSource};
pub use error::{ChannelError, Error, ProviderError, Result, TurnError};
pub use event::{DomainEvent, EventBus, ReplySource};
pub use message::{Message, PromptTurn, Role};
pub use profile::{ConversationState, ProfileSummary, UserProfile};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use store::{ProfileHandle, ProfileStore};
