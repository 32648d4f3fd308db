//! Gemini `generateContent` client.

use super::{GenerationParams, ProviderError, TokenUsage, build_http_client, status_error};
use crate::observability::TracedClientExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiResponse {
    pub text: Option<String>,
    pub usage: TokenUsage,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, model, GEMINI_API_BASE)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key is empty".to_string(),
            ));
        }

        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client()?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    /// Sends a single-turn prompt and returns the first candidate's text.
    #[tracing::instrument(skip(self, prompt, params), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GeminiResponse, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig::from(params)),
        };

        tracing::debug!("Sending request to Gemini API");

        let response = self
            .client
            .traced_post(&self.api_url("generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error("Gemini", status, &body));
        }

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<GeminiResponse, ProviderError> {
    let api_response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let candidate = api_response.candidates.first();
    if candidate.and_then(|c| c.finish_reason.as_deref()) == Some("SAFETY") {
        return Err(ProviderError::ContentFiltered);
    }

    let text = candidate.and_then(|c| {
        let joined: String = c
            .content
            .as_ref()?
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        if joined.is_empty() { None } else { Some(joined) }
    });

    let usage = api_response.usage_metadata.unwrap_or_default();
    let prompt_tokens = usage.prompt_token_count.unwrap_or(0);
    let completion_tokens = usage.candidates_token_count.unwrap_or(0);

    Ok(GeminiResponse {
        text,
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: usage
                .total_token_count
                .unwrap_or(prompt_tokens + completion_tokens),
        },
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl From<&GenerationParams> for GenerationConfig {
    fn from(params: &GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_output_tokens: params.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candidate_text_and_usage() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "there"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
        }"#;

        let parsed = parse_response(body).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("Hello there"));
        assert_eq!(parsed.usage.total_tokens, 6);
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let parsed = parse_response(r#"{"candidates": []}"#).unwrap();
        assert_eq!(parsed.text, None);
    }

    #[test]
    fn safety_block_is_content_filtered() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert!(matches!(
            parse_response(body),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn generation_config_skips_unset_fields() {
        let params = GenerationParams {
            temperature: Some(0.3),
            top_k: Some(40),
            ..Default::default()
        };
        let json = serde_json::to_value(GenerationConfig::from(&params)).unwrap();
        assert_eq!(json["topK"], 40);
        assert!(json.get("topP").is_none());
    }

    #[test]
    fn blank_key_is_not_configured() {
        assert!(matches!(
            GeminiClient::new("  ", "gemini-2.0-flash"),
            Err(ProviderError::NotConfigured(_))
        ));
    }
}
