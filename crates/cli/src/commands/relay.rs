//! `seriesai relay` — Answer iMessages by polling the Messages database.

use std::path::PathBuf;
use std::sync::Arc;

use seriesai_agent::TurnProcessor;
use seriesai_channels::{AppleScriptChannel, MessagesDb, Relay, RelaySettings};
use seriesai_config::AppConfig;
use seriesai_core::event::EventBus;
use seriesai_core::store::ProfileStore;
use seriesai_memory::InMemoryProfileStore;

pub async fn run(db: Option<PathBuf>, interval: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(secs) = interval {
        if secs == 0 {
            return Err("--interval must be at least 1 second".into());
        }
        config.relay.poll_interval_secs = secs;
    }

    if !AppleScriptChannel::is_supported() {
        tracing::warn!("Not running on macOS; replies cannot be delivered");
    }

    let db_path = db.unwrap_or_else(|| config.relay.db_path());
    let source = MessagesDb::open_checked(&db_path).await?;

    let store: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let event_bus = Arc::new(EventBus::default());
    let processor = TurnProcessor::from_config(&config, store).with_event_bus(event_bus.clone());

    let settings = RelaySettings::from_config(&config.relay);

    println!("SeriesAI Relay");
    println!("   Database:  {}", db_path.display());
    println!("   Interval:  {}s", config.relay.poll_interval_secs);
    println!("   Greeting:  {:?}", settings.greeting_prefix);
    println!("   Press Ctrl+C to stop.\n");

    let mut relay = Relay::new(
        Arc::new(source),
        Arc::new(AppleScriptChannel::new()),
        Arc::new(processor),
        settings,
    )
    .with_event_bus(event_bus);

    relay.restore(chrono::Utc::now())?;
    relay.run().await;

    Ok(())
}
