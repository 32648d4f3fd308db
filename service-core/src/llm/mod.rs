//! Clients for hosted LLM APIs.
//!
//! Both clients speak plain JSON over reqwest and propagate trace context on
//! every call. Errors are mapped onto [`ProviderError`] so callers can decide
//! between failing and falling back.

pub mod gemini;
pub mod openai_compat;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::{GeminiClient, GeminiResponse};
pub use openai_compat::{
    ChatMessage, ChatRole, Completion, CompletionRequest, FunctionCall, FunctionDefinition,
    OpenAiCompatClient, ToolCall, ToolDefinition,
};

/// HTTP timeout applied to every LLM request.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Sampling parameters shared by both providers. Unset fields are omitted
/// from the request.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

/// Maps a non-success status and body to a provider error.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> ProviderError {
    if status.as_u16() == 429 {
        return ProviderError::RateLimited;
    }
    ProviderError::ApiError(format!(
        "{} API error {}: {}",
        provider,
        status,
        body.chars().take(500).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_accumulates() {
        let mut total = TokenUsage::default();
        total.add(&TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        total.add(&TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(total.total_tokens, 18);
        assert_eq!(total.prompt_tokens, 11);
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = status_error("Gemini", reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, ProviderError::RateLimited));

        let err = status_error("Gemini", reqwest::StatusCode::BAD_REQUEST, "bad");
        assert!(matches!(err, ProviderError::ApiError(msg) if msg.contains("400")));
    }
}
