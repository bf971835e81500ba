//! LLM provider implementations for SeriesAI.
//!
//! All providers implement the `seriesai_core::Provider` trait. The
//! `CompletionClient` wraps one of them with the model, token budget and
//! deadline used for every turn.

pub mod completion;
pub mod openai_compat;

pub use completion::{CompletionClient, build_from_config};
pub use openai_compat::OpenAiCompatProvider;
