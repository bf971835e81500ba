//! `seriesai chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use seriesai_agent::TurnProcessor;
use seriesai_channels::CliChannel;
use seriesai_config::AppConfig;
use seriesai_core::store::ProfileStore;
use seriesai_memory::InMemoryProfileStore;

pub async fn run(message: Option<String>, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  WARNING: No API key configured.");
        eprintln!("  Olivia will still send her welcome, but every later reply will be");
        eprintln!("  the fallback apology until you set one of:");
        eprintln!("    OPENROUTER_API_KEY = 'sk-or-v1-...'");
        eprintln!("    SERIESAI_API_KEY   = '...'");
        eprintln!("  or add api_key to {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let store: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let processor = TurnProcessor::from_config(&config, store);

    let channel = match user {
        Some(id) => CliChannel::with_user(id),
        None => CliChannel::new(),
    };

    if let Some(msg) = message {
        // Single message mode
        let reply = processor.process(channel.user_id(), &msg).await?;
        println!("{reply}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  SeriesAI — chatting with Olivia");
    println!();
    println!("  Model:     {}", config.model_name);
    println!("  Endpoint:  {}", config.api_url);
    println!("  User:      {}", channel.user_id());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut rx = channel.start();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(inbound) => {
                eprint!("  ...");
                match processor.process(&inbound.sender_id, &inbound.text).await {
                    Ok(reply) => {
                        eprint!("\r     \r");
                        println!();
                        for line in reply.lines() {
                            println!("  Olivia > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }

                print!("  You > ");
                std::io::stdout().flush()?;
            }
            Err(e) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}
