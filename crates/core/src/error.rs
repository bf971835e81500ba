//! Error types for the SeriesAI domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all SeriesAI operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Turn errors ---
    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the remote completion endpoint.
///
/// Every variant counts as "upstream unavailable": the turn processor turns
/// any of them into the fixed apology reply.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {message} (status: {status_code})")]
    AuthenticationFailed { status_code: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// HTTP status reported by the endpoint, if the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } | Self::AuthenticationFailed { status_code, .. } => {
                Some(*status_code)
            }
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Inbound source unavailable: {0}")]
    SourceUnavailable(String),
}

/// Errors surfaced to the immediate caller of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 502,
            message: "Bad gateway".into(),
        });
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad gateway"));
    }

    #[test]
    fn provider_error_status_codes() {
        let api = ProviderError::ApiError {
            status_code: 500,
            message: String::new(),
        };
        assert_eq!(api.status_code(), Some(500));
        assert_eq!(
            ProviderError::RateLimited { retry_after_secs: 5 }.status_code(),
            Some(429)
        );
        assert_eq!(ProviderError::Network("refused".into()).status_code(), None);

        let denied = ProviderError::AuthenticationFailed {
            status_code: 403,
            message: "forbidden".into(),
        };
        assert_eq!(denied.status_code(), Some(403));
        assert!(denied.to_string().contains("403"));
    }

    #[test]
    fn delivery_error_names_channel() {
        let err = Error::Channel(ChannelError::DeliveryFailed {
            channel: "imessage".into(),
            reason: "osascript exited with 1".into(),
        });
        assert!(err.to_string().contains("imessage"));
        assert!(err.to_string().contains("osascript"));
    }

    #[test]
    fn turn_error_converts_into_top_level() {
        let err: Error = TurnError::InvalidInput("empty user_id".into()).into();
        assert!(matches!(err, Error::Turn(TurnError::InvalidInput(_))));
    }
}
