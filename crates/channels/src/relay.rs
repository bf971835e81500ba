//! Messages relay — polls an inbound source and answers through a channel.
//!
//! Each tick:
//!
//! 1. Greetings newer than the high-water mark start a conversation for
//!    senders not already tracked; the agent is fed the start trigger.
//! 2. Every tracked conversation is polled past its cursor. The cursor moves
//!    before the turn runs, so a message is handed to the agent at most once.
//! 3. Conversations idle past the stale limit are dropped.
//! 4. Cursors and the high-water mark are written to the state file.
//!
//! Nothing here is fatal: source, turn and delivery errors are logged and the
//! loop carries on.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use seriesai_config::RelayConfig;
use seriesai_core::agent::TurnHandler;
use seriesai_core::channel::{Channel, InboundSource};
use seriesai_core::event::{DomainEvent, EventBus, preview};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Relay behaviour knobs.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub greeting_prefix: String,
    pub start_trigger: String,
    pub stale_after: ChronoDuration,
    pub poll_interval: Duration,
    pub state_file: Option<PathBuf>,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            greeting_prefix: config.greeting_prefix.clone(),
            start_trigger: config.start_trigger.clone(),
            stale_after: ChronoDuration::hours(config.stale_after_hours as i64),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            state_file: Some(config.state_file()),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            state_file: None,
            ..Self::from_config(&RelayConfig::default())
        }
    }
}

/// One tracked sender.
#[derive(Debug, Clone)]
struct Conversation {
    last_sequence_id: i64,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

/// What survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayState {
    /// Highest sequence id seen by any query
    pub high_water: i64,
    /// Per-sender cursor
    pub conversations: BTreeMap<String, i64>,
}

impl RelayState {
    pub fn load(path: &Path) -> std::io::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let state = serde_json::from_str(&content).map_err(std::io::Error::other)?;
        Ok(Some(state))
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)
    }
}

/// Counts from one poll tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub started: usize,
    pub handled: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct Relay {
    source: Arc<dyn InboundSource>,
    channel: Arc<dyn Channel>,
    handler: Arc<dyn TurnHandler>,
    settings: RelaySettings,
    conversations: HashMap<String, Conversation>,
    high_water: i64,
    event_bus: Option<Arc<EventBus>>,
}

impl Relay {
    pub fn new(
        source: Arc<dyn InboundSource>,
        channel: Arc<dyn Channel>,
        handler: Arc<dyn TurnHandler>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            source,
            channel,
            handler,
            settings,
            conversations: HashMap::new(),
            high_water: 0,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Restore cursors from the state file, if one is configured and present.
    ///
    /// Restored conversations count as active from `now`.
    pub fn restore(&mut self, now: DateTime<Utc>) -> std::io::Result<()> {
        let Some(path) = self.settings.state_file.clone() else {
            return Ok(());
        };
        let Some(state) = RelayState::load(&path)? else {
            return Ok(());
        };

        self.apply_state(state, now);
        info!(
            conversations = self.conversations.len(),
            high_water = self.high_water,
            "Relay state restored from {}",
            path.display()
        );
        Ok(())
    }

    fn apply_state(&mut self, state: RelayState, now: DateTime<Utc>) {
        let newest_cursor = state.conversations.values().copied().max().unwrap_or(0);
        self.high_water = state.high_water.max(newest_cursor);
        self.conversations = state
            .conversations
            .into_iter()
            .map(|(sender, last_sequence_id)| {
                let conversation = Conversation {
                    last_sequence_id,
                    started_at: now,
                    last_activity: now,
                };
                (sender, conversation)
            })
            .collect();
    }

    /// Current cursors in persistable form.
    pub fn state(&self) -> RelayState {
        RelayState {
            high_water: self.high_water,
            conversations: self
                .conversations
                .iter()
                .map(|(sender, c)| (sender.clone(), c.last_sequence_id))
                .collect(),
        }
    }

    /// Write the state file, if one is configured.
    pub fn persist(&self) -> std::io::Result<()> {
        match &self.settings.state_file {
            Some(path) => self.state().save(path),
            None => Ok(()),
        }
    }

    pub fn is_tracking(&self, sender: &str) -> bool {
        self.conversations.contains_key(sender)
    }

    pub fn tracked_count(&self) -> usize {
        self.conversations.len()
    }

    /// Run one poll tick at `now`.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> PollSummary {
        let mut summary = PollSummary::default();
        self.start_new_conversations(now, &mut summary).await;
        self.continue_conversations(now, &mut summary).await;
        summary
    }

    async fn start_new_conversations(&mut self, now: DateTime<Utc>, summary: &mut PollSummary) {
        let greetings = match self
            .source
            .fetch_greetings(self.high_water, &self.settings.greeting_prefix)
            .await
        {
            Ok(greetings) => greetings,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Greeting poll failed");
                return;
            }
        };

        for greeting in greetings {
            self.high_water = self.high_water.max(greeting.sequence_id);

            if self.conversations.contains_key(&greeting.sender_id) {
                continue;
            }

            info!(
                sender = %greeting.sender_id,
                text = %preview(&greeting.text, 80),
                "New conversation"
            );
            self.conversations.insert(
                greeting.sender_id.clone(),
                Conversation {
                    last_sequence_id: greeting.sequence_id,
                    started_at: now,
                    last_activity: now,
                },
            );
            summary.started += 1;

            let trigger = self.settings.start_trigger.clone();
            self.respond(&greeting.sender_id, &trigger, summary).await;
        }
    }

    async fn continue_conversations(&mut self, now: DateTime<Utc>, summary: &mut PollSummary) {
        let mut senders: Vec<String> = self.conversations.keys().cloned().collect();
        senders.sort();

        for sender in senders {
            let Some(after) = self.conversations.get(&sender).map(|c| c.last_sequence_id) else {
                continue;
            };

            let messages = match self.source.fetch_messages(after, Some(&sender)).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(sender = %sender, error = %e, "Message poll failed");
                    continue;
                }
            };

            for message in messages {
                if let Some(conversation) = self.conversations.get_mut(&sender) {
                    conversation.last_sequence_id =
                        conversation.last_sequence_id.max(message.sequence_id);
                    conversation.last_activity = now;
                }
                self.high_water = self.high_water.max(message.sequence_id);

                info!(sender = %sender, text = %preview(&message.text, 80), "Message received");
                self.respond(&sender, &message.text, summary).await;
            }
        }
    }

    async fn respond(&self, sender: &str, text: &str, summary: &mut PollSummary) {
        let reply = match self.handler.handle_turn(sender, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(sender, error = %e, "Turn rejected");
                return;
            }
        };
        summary.handled += 1;

        match self.channel.send(sender, &reply).await {
            Ok(()) => {
                summary.delivered += 1;
                debug!(sender, channel = self.channel.name(), "Reply delivered");
            }
            Err(e) => {
                summary.failed += 1;
                error!(sender, channel = self.channel.name(), error = %e, "Failed to deliver reply");
                if let Some(bus) = &self.event_bus {
                    bus.publish(DomainEvent::DeliveryFailed {
                        channel: self.channel.name().to_string(),
                        recipient: sender.to_string(),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }
    }

    /// Drop conversations idle longer than the stale limit. Returns how many.
    pub fn cleanup_stale(&mut self, now: DateTime<Utc>) -> usize {
        let stale_after = self.settings.stale_after;
        let before = self.conversations.len();

        self.conversations.retain(|sender, c| {
            let idle = now - c.last_activity;
            let keep = idle <= stale_after;
            if !keep {
                info!(
                    sender = %sender,
                    idle_hours = idle.num_minutes() as f64 / 60.0,
                    started_at = %c.started_at,
                    "Removing stale conversation"
                );
            }
            keep
        });

        before - self.conversations.len()
    }

    /// Poll until `shutdown` resolves, then persist state.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut interval = tokio::time::interval(self.settings.poll_interval);

        info!(
            source = self.source.name(),
            channel = self.channel.name(),
            interval_secs = self.settings.poll_interval.as_secs(),
            "Relay started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    let summary = self.poll_once(now).await;
                    if summary != PollSummary::default() {
                        info!(?summary, "Poll complete");
                    }
                    self.cleanup_stale(now);
                    if let Err(e) = self.persist() {
                        error!(error = %e, "Failed to persist relay state");
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        if let Err(e) = self.persist() {
            error!(error = %e, "Failed to persist relay state");
        }
        info!("Relay stopped");
    }

    /// Poll until Ctrl-C.
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }
}
