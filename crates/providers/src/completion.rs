//! Completion client — one call to the remote model per non-first turn.
//!
//! Wraps a [`Provider`] with the model name, token budget and a hard deadline.
//! Every failure comes back as a typed [`ProviderError`]; deciding what the
//! user sees instead is the turn processor's job.

use seriesai_config::AppConfig;
use seriesai_core::error::ProviderError;
use seriesai_core::message::PromptTurn;
use seriesai_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::openai_compat::{DEFAULT_TIMEOUT, OpenAiCompatProvider};

pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 1000,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Send `turns` and return the first choice's text.
    pub async fn complete(
        &self,
        turns: Vec<PromptTurn>,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: turns,
            temperature,
            max_tokens: Some(self.max_tokens),
        };

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("no response within {}s", self.timeout.as_secs()))
            })??;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }

        Ok(response.content)
    }
}

/// Build the completion client described by `config`.
///
/// A missing API key still yields a client; every call then fails with
/// `NotConfigured`, which the turn processor turns into the apology reply.
pub fn build_from_config(config: &AppConfig) -> CompletionClient {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let name = if config.api_url.contains("openrouter.ai") {
        "openrouter"
    } else {
        "openai_compat"
    };

    let provider = OpenAiCompatProvider::new(
        name,
        &config.api_url,
        config.api_key.clone().unwrap_or_default(),
    )
    .with_referer(&config.app_referer)
    .with_timeout(timeout);

    info!(provider = name, model = %config.model_name, "Completion client configured");

    CompletionClient::new(Arc::new(provider), &config.model_name)
        .with_max_tokens(config.max_tokens)
        .with_timeout(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seriesai_core::message::Role;
    use seriesai_core::provider::ProviderResponse;
    use std::sync::Mutex;

    struct RecordingProvider {
        last: Mutex<Option<ProviderRequest>>,
        delay: Duration,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(self.delay).await;
            let model = request.model.clone();
            *self.last.lock().unwrap() = Some(request);
            Ok(ProviderResponse {
                content: "ok".into(),
                usage: None,
                model,
            })
        }
    }

    #[tokio::test]
    async fn complete_builds_request() {
        let provider = Arc::new(RecordingProvider {
            last: Mutex::new(None),
            delay: Duration::ZERO,
        });
        let client = CompletionClient::new(provider.clone(), "test-model").with_max_tokens(50);

        let reply = client
            .complete(vec![PromptTurn::system("sys"), PromptTurn::new(Role::User, "hi")], 0.3)
            .await
            .unwrap();
        assert_eq!(reply, "ok");

        let req = provider.last.lock().unwrap().take().unwrap();
        assert_eq!(req.model, "test-model");
        assert_eq!(req.max_tokens, Some(50));
        assert_eq!(req.messages.len(), 2);
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = Arc::new(RecordingProvider {
            last: Mutex::new(None),
            delay: Duration::from_secs(60),
        });
        let client = CompletionClient::new(provider, "m").with_timeout(Duration::from_secs(30));

        let err = client.complete(vec![PromptTurn::system("sys")], 0.7).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[test]
    fn build_from_default_config() {
        let client = build_from_config(&AppConfig::default());
        assert_eq!(client.provider_name(), "openrouter");
        assert_eq!(client.model(), "meta-llama/llama-4-maverick:free");
        assert_eq!(client.max_tokens, 1000);
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = build_from_config(&AppConfig::default());
        let err = client.complete(vec![PromptTurn::system("sys")], 0.7).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
