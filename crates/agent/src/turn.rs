//! Turn processor — runs one inbound message through to one reply.
//!
//! The profile lock is held for the whole turn, so turns for the same user
//! are serialized while different users proceed in parallel. A turn is never
//! half-applied: the assistant reply is appended only after the completion
//! call has returned or fallen back.

use async_trait::async_trait;
use chrono::Utc;
use seriesai_config::AppConfig;
use seriesai_core::agent::TurnHandler;
use seriesai_core::error::TurnError;
use seriesai_core::event::{DomainEvent, EventBus, ReplySource, preview};
use seriesai_core::store::ProfileStore;
use seriesai_providers::CompletionClient;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::{PromptAssembler, TurnPlan};
use crate::prompts::{FALLBACK_REPLY, WELCOME_SCRIPT};

pub struct TurnProcessor {
    store: Arc<dyn ProfileStore>,
    assembler: PromptAssembler,
    completion: CompletionClient,
    temperature: f32,
    event_bus: Option<Arc<EventBus>>,
}

impl TurnProcessor {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        completion: CompletionClient,
        max_context_length: usize,
    ) -> Self {
        Self {
            store,
            assembler: PromptAssembler::new(max_context_length),
            completion,
            temperature: 0.7,
            event_bus: None,
        }
    }

    /// Build a processor over `store` using the configured endpoint, model and bounds.
    pub fn from_config(config: &AppConfig, store: Arc<dyn ProfileStore>) -> Self {
        let completion = seriesai_providers::build_from_config(config);
        Self::new(store, completion, config.max_context_length).with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Publish turn events to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    pub fn completion(&self) -> &CompletionClient {
        &self.completion
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// Record `inbound_text` for `user_id` and produce the reply.
    ///
    /// Upstream failures are absorbed into [`FALLBACK_REPLY`]; the only error
    /// is an empty user id or message.
    pub async fn process(&self, user_id: &str, inbound_text: &str) -> Result<String, TurnError> {
        if user_id.trim().is_empty() {
            return Err(TurnError::InvalidInput("user_id must not be empty".into()));
        }
        if inbound_text.trim().is_empty() {
            return Err(TurnError::InvalidInput("message must not be empty".into()));
        }

        let handle = self.store.get_or_create(user_id).await;
        let mut profile = handle.lock().await;

        profile.record_inbound(inbound_text, Utc::now());
        debug!(user_id, total_messages = profile.total_messages, "Inbound message recorded");

        self.publish(DomainEvent::MessageReceived {
            user_id: user_id.to_string(),
            content_preview: preview(inbound_text, 50),
            timestamp: Utc::now(),
        });

        let (reply, source) = match self.assembler.plan(&profile) {
            TurnPlan::Welcome => (WELCOME_SCRIPT.to_string(), ReplySource::Welcome),
            TurnPlan::Completion(turns) => {
                match self.completion.complete(turns, self.temperature).await {
                    Ok(text) => (text, ReplySource::Model),
                    Err(e) => {
                        warn!(
                            user_id,
                            provider = %self.completion.provider_name(),
                            status = ?e.status_code(),
                            error = %e,
                            "Completion failed, replying with fallback"
                        );
                        self.publish(DomainEvent::UpstreamFailed {
                            user_id: user_id.to_string(),
                            provider: self.completion.provider_name().to_string(),
                            status_code: e.status_code(),
                            error_message: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        (FALLBACK_REPLY.to_string(), ReplySource::Fallback)
                    }
                }
            }
        };

        profile.record_reply(reply.as_str(), Utc::now());
        let history_length = profile.conversation_history.len();
        drop(profile);

        info!(user_id, source = ?source, history_length, "Turn complete");
        self.publish(DomainEvent::ReplyGenerated {
            user_id: user_id.to_string(),
            source,
            history_length,
            timestamp: Utc::now(),
        });

        Ok(reply)
    }
}

#[async_trait]
impl TurnHandler for TurnProcessor {
    async fn handle_turn(&self, user_id: &str, inbound_text: &str) -> Result<String, TurnError> {
        self.process(user_id, inbound_text).await
    }
}
