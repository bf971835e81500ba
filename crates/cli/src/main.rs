//! SeriesAI CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config
//! - `chat`    — Talk to Olivia from the terminal
//! - `serve`   — Start the HTTP API server
//! - `relay`   — Answer iMessages from the Messages database
//! - `doctor`  — Diagnose system health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "seriesai",
    about = "SeriesAI — Olivia, the onboarding assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat with Olivia in the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation to continue (defaults to `local_user`)
        #[arg(long)]
        user: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Poll the Messages database and reply over iMessage
    Relay {
        /// Path to chat.db
        #[arg(long)]
        db: Option<std::path::PathBuf>,

        /// Seconds between polls
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message, user } => commands::chat::run(message, user).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Relay { db, interval } => commands::relay::run(db, interval).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
