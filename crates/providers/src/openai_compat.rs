//! OpenAI-compatible provider implementation.
//!
//! Works with OpenRouter (the default), OpenAI, Ollama, vLLM and any other
//! endpoint that exposes `/chat/completions` in the OpenAI shape. Only
//! non-streaming text completions are used.

use async_trait::async_trait;
use seriesai_core::error::ProviderError;
use seriesai_core::message::PromptTurn;
use seriesai_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    referer: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            referer: None,
            client: build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Send `HTTP-Referer` with every request (OpenRouter app attribution).
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Replace the HTTP client with one using `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(turns: &[PromptTurn]) -> Vec<ApiMessage<'_>> {
        turns
            .iter()
            .map(|t| ApiMessage {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect()
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        match &self.referer {
            Some(referer) => builder.header("HTTP-Referer", referer),
            None => builder,
        }
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl seriesai_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key configured for {}",
                self.name
            )));
        }

        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: &request.model,
            messages: Self::to_api_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            provider = %self.name,
            model = %request.model,
            turns = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed {
                status_code: status,
                message: "Invalid API key or insufficient permissions".into(),
            });
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse("Empty message content".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            content,
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(map_send_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use seriesai_core::Provider;
    use seriesai_core::message::Role;
    use std::sync::{Arc, Mutex};

    /// Spawn a one-route server answering `/chat/completions` with `status` and `body`.
    /// Returns the base URL and the last request body/headers seen.
    async fn spawn_upstream(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (String, Arc<Mutex<Option<(HeaderMap, serde_json::Value)>>>) {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move |headers: HeaderMap, Json(req): Json<serde_json::Value>| {
                let seen = seen_clone.clone();
                let body = body.clone();
                async move {
                    *seen.lock().unwrap() = Some((headers, req));
                    (status, Json(body))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "meta-llama/llama-4-maverick:free".into(),
            messages: vec![
                PromptTurn::system("You are Olivia"),
                PromptTurn::new(Role::User, "blue"),
            ],
            temperature: 0.7,
            max_tokens: Some(1000),
        }
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://localhost:9999/v1/", "k");
        assert_eq!(provider.base_url(), "http://localhost:9999/v1");
    }

    #[test]
    fn message_conversion() {
        let turns = vec![PromptTurn::system("You are helpful"), PromptTurn::new(Role::Assistant, "hey")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&turns);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let provider = OpenAiCompatProvider::new("openrouter", "https://openrouter.ai/api/v1", "");
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn successful_completion_extracts_first_choice() {
        let (url, seen) = spawn_upstream(
            StatusCode::OK,
            serde_json::json!({
                "model": "meta-llama/llama-4-maverick",
                "choices": [{"message": {"role": "assistant", "content": "love that color!"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
            }),
        )
        .await;

        let provider =
            OpenAiCompatProvider::new("openrouter", url, "sk-test").with_referer("https://series.app");
        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.content, "love that color!");
        assert_eq!(response.usage.unwrap().total_tokens, 14);

        let (headers, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["http-referer"], "https://series.app");
        assert_eq!(body["model"], "meta-llama/llama-4-maverick:free");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "blue");
        assert!(body.get("stream").is_none());
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let (url, _) = spawn_upstream(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": "boom"}),
        )
        .await;
        let provider = OpenAiCompatProvider::new("openrouter", url, "sk-test");
        let err = provider.complete(request()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn rate_limit_and_auth_are_classified() {
        let (url, _) = spawn_upstream(StatusCode::TOO_MANY_REQUESTS, serde_json::json!({})).await;
        let provider = OpenAiCompatProvider::new("openrouter", url, "sk-test");
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::RateLimited { .. })
        ));

        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let (url, _) = spawn_upstream(status, serde_json::json!({})).await;
            let provider = OpenAiCompatProvider::new("openrouter", url, "sk-bad");
            let err = provider.complete(request()).await.unwrap_err();
            assert!(matches!(err, ProviderError::AuthenticationFailed { .. }));
            assert_eq!(err.status_code(), Some(status.as_u16()));
        }
    }

    #[tokio::test]
    async fn empty_choices_or_content_is_malformed() {
        let (url, _) = spawn_upstream(StatusCode::OK, serde_json::json!({"choices": []})).await;
        let provider = OpenAiCompatProvider::new("openrouter", url, "sk-test");
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::MalformedResponse(_))
        ));

        let (url, _) = spawn_upstream(
            StatusCode::OK,
            serde_json::json!({"choices": [{"message": {"content": "   "}}]}),
        )
        .await;
        let provider = OpenAiCompatProvider::new("openrouter", url, "sk-test");
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let provider = OpenAiCompatProvider::new("openrouter", "http://127.0.0.1:1", "sk-test");
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)));
    }
}
