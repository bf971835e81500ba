//! iMessage delivery via AppleScript.
//!
//! Runs `osascript -e` with a Messages "send … to buddy" script. Recipient
//! and text are interpolated into AppleScript string literals, so both are
//! escaped first.

use async_trait::async_trait;
use seriesai_core::channel::Channel;
use seriesai_core::error::ChannelError;
use tokio::process::Command;
use tracing::{debug, info};

pub struct AppleScriptChannel {
    program: String,
}

impl AppleScriptChannel {
    pub fn new() -> Self {
        Self {
            program: "osascript".into(),
        }
    }

    /// Use a different interpreter binary (useful for testing).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether delivery can work on this platform at all.
    pub fn is_supported() -> bool {
        cfg!(target_os = "macos")
    }
}

impl Default for AppleScriptChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape `s` for use inside a double-quoted AppleScript string.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The script that sends `text` to `recipient` over the iMessage service.
pub fn send_script(recipient: &str, text: &str) -> String {
    format!(
        r#"tell application "Messages"
  set targetService to 1st service whose service type = iMessage
  set theBuddy to buddy "{}" of targetService
  send "{}" to theBuddy
end tell"#,
        escape(recipient),
        escape(text)
    )
}

/// Turn a failed run's stderr into a delivery error.
fn classify_failure(recipient: &str, status: std::process::ExitStatus, stderr: &str) -> ChannelError {
    let lower = stderr.to_ascii_lowercase();
    let reason = if lower.contains("not authorized to send apple events") || lower.contains("-1743") {
        format!(
            "automation denied: {}. Allow this app to control Messages in System Settings → Privacy & Security → Automation",
            stderr.trim()
        )
    } else {
        format!("osascript exited with {status}: {}", stderr.trim())
    };

    ChannelError::DeliveryFailed {
        channel: format!("imessage:{recipient}"),
        reason,
    }
}

#[async_trait]
impl Channel for AppleScriptChannel {
    fn name(&self) -> &str {
        "imessage"
    }

    async fn send(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        if recipient.trim().is_empty() {
            return Err(ChannelError::DeliveryFailed {
                channel: "imessage".into(),
                reason: "empty recipient".into(),
            });
        }

        debug!(recipient, chars = text.chars().count(), "Sending via AppleScript");

        let output = Command::new(&self.program)
            .arg("-e")
            .arg(send_script(recipient, text))
            .output()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "imessage".into(),
                reason: format!("failed to run {}: {e}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(recipient, output.status, &stderr));
        }

        info!(recipient, "Message sent");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(Self::is_supported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape(r"C:\path"), r"C:\\path");
        assert_eq!(escape(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn script_embeds_escaped_values() {
        let script = send_script("+15551234567", r#"ur "bio" pls"#);
        assert!(script.contains(r#"buddy "+15551234567" of targetService"#));
        assert!(script.contains(r#"send "ur \"bio\" pls" to theBuddy"#));
        assert!(script.starts_with("tell application \"Messages\""));
    }

    #[test]
    fn script_keeps_newlines() {
        let script = send_script("a@b.com", "line one\nline two");
        assert!(script.contains("line one\nline two"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run_is_delivered() {
        let channel = AppleScriptChannel::with_program("true");
        assert!(channel.send("+15551234567", "hey").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_run_is_delivery_failure() {
        let channel = AppleScriptChannel::with_program("false");
        let err = channel.send("+15551234567", "hey").await.unwrap_err();
        assert!(matches!(err, ChannelError::DeliveryFailed { .. }));
    }

    #[tokio::test]
    async fn missing_interpreter_is_delivery_failure() {
        let channel = AppleScriptChannel::with_program("/nonexistent/osascript");
        let err = channel.send("+15551234567", "hey").await.unwrap_err();
        assert!(matches!(err, ChannelError::DeliveryFailed { .. }));
    }

    #[tokio::test]
    async fn empty_recipient_rejected() {
        let channel = AppleScriptChannel::with_program("true");
        assert!(channel.send("  ", "hey").await.is_err());
    }
}
