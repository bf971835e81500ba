//! Shared test doubles for turn processing tests.

use seriesai_core::error::ProviderError;
use seriesai_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns scripted replies in order, then repeats the last.
///
/// Records every request so tests can inspect the assembled turns.
pub struct ScriptedProvider {
    replies: Vec<Result<String, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    /// Always fail with a 503.
    pub fn failing() -> Self {
        Self::new(vec![Err(ProviderError::ApiError {
            status_code: 503,
            message: "upstream unavailable".into(),
        })])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len().min(self.replies.len().saturating_sub(1));
        requests.push(request);

        match self.replies.get(index) {
            Some(Ok(text)) => Ok(make_text_response(text)),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ProviderError::NotConfigured("no scripted replies".into())),
        }
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
