//! Channel implementations for SeriesAI.
//!
//! Inbound sources feed the agent, delivery channels carry its replies, and
//! the relay ties the two together.
//!
//! Available pieces:
//! - **MessagesDb** — polls the macOS Messages database (`chat.db`)
//! - **AppleScript** — sends iMessages through `osascript`
//! - **CLI** — interactive terminal chat (stdin/stdout)
//! - **Relay** — the polling loop connecting a source, the agent and a channel

pub mod applescript;
pub mod cli;
pub mod messages_db;
pub mod relay;

pub use applescript::AppleScriptChannel;
pub use cli::CliChannel;
pub use messages_db::MessagesDb;
pub use relay::{PollSummary, Relay, RelaySettings, RelayState};
