//! CLI channel — interactive terminal-based chat.
//!
//! Reads stdin lines as inbound messages from `local_user` and prints
//! replies to stdout. Used by `seriesai chat` interactive mode.

use async_trait::async_trait;
use seriesai_core::channel::{Channel, InboundMessage};
use seriesai_core::error::ChannelError;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Sender id used for everything typed at the terminal.
pub const LOCAL_USER: &str = "local_user";

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    user_id: String,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            user_id: LOCAL_USER.into(),
        }
    }

    /// Attribute terminal input to `user_id` instead of `local_user`.
    pub fn with_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Start reading stdin. The receiver closes on EOF or an exit command.
    pub fn start(&self) -> mpsc::Receiver<Result<InboundMessage, ChannelError>> {
        let (tx, rx) = mpsc::channel(32);
        let user_id = self.user_id.clone();

        tokio::spawn(async move {
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();
            let mut sequence_id = 0;

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }

                        if is_exit_command(&line) {
                            break;
                        }

                        sequence_id += 1;
                        let msg = InboundMessage {
                            sequence_id,
                            sender_id: user_id.clone(),
                            text: line,
                        };

                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        rx
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines that end an interactive session.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn send(&self, _recipient: &str, text: &str) -> Result<(), ChannelError> {
        println!("{text}");
        Ok(())
    }
}
