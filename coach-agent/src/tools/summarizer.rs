use super::{required_str, Tool};
use crate::config::AgentConfig;
use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::{json, Value};
use service_core::llm::{
    ChatMessage, CompletionRequest, GeminiClient, GenerationParams, OpenAiCompatClient,
    ProviderError,
};

const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 4096;

const DEEPSEEK_SYSTEM_PROMPT: &str = "You are a helpful assistant specialized in creating concise summaries. Generate summaries in markdown format, maximum 512 characters.";

pub fn summary_prompt(content: &str) -> String {
    format!(
        "You are a helpful assistant specialized in summarizing documents.
Generate a concise TL;DR summary in markdown format, maximum 512 characters, highlighting the most significant insights from the following content:

{content}

Respond only with the summary.
"
    )
}

fn text_argument(tool: &str, args: &Value) -> Result<String, ToolError> {
    let text = required_str(tool, args, "text")?;
    if text.trim().is_empty() {
        return Err(ToolError::InvalidInput(
            "No text provided to summarize.".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Trims the summary and caps it at `max_length` characters.
fn finish_summary(raw: Option<&str>, max_length: usize) -> Result<String, ToolError> {
    let summary = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        ToolError::Provider(ProviderError::InvalidResponse(
            "Unable to generate summary".to_string(),
        ))
    })?;

    if summary.chars().count() > max_length {
        tracing::debug!(max_length, "Truncating summary");
        return Ok(summary.chars().take(max_length).collect());
    }
    Ok(summary.to_string())
}

fn text_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string", "description": "The text to summarize."}
        },
        "required": ["text"]
    })
}

pub struct GeminiSummarizerTool {
    client: GeminiClient,
    max_length: usize,
}

impl GeminiSummarizerTool {
    pub fn new(client: GeminiClient, max_length: usize) -> Self {
        Self { client, max_length }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, ToolError> {
        let api_key = config.gemini.api_key.as_deref().ok_or_else(|| {
            ToolError::NotConfigured("GEMINI_API_KEY must be set for the Gemini summarizer".to_string())
        })?;
        let client = GeminiClient::new(api_key, &config.gemini.model_id)?;
        Ok(Self::new(client, config.summarizer.max_length))
    }
}

#[async_trait]
impl Tool for GeminiSummarizerTool {
    fn name(&self) -> &'static str {
        "gemini_summarizer"
    }

    fn description(&self) -> &'static str {
        "Use this tool to summarize a piece of text using Google's Gemini model."
    }

    fn parameters(&self) -> Value {
        text_parameters()
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let text = text_argument(self.name(), &args)?;
        let params = GenerationParams {
            temperature: Some(SUMMARY_TEMPERATURE),
            top_p: Some(0.8),
            top_k: Some(40),
            max_tokens: Some(SUMMARY_MAX_TOKENS),
        };

        let response = self.client.generate(&summary_prompt(&text), &params).await?;
        tracing::debug!(
            model = self.client.model(),
            total_tokens = response.usage.total_tokens,
            "Gemini summary generated"
        );
        finish_summary(response.text.as_deref(), self.max_length)
    }
}

pub struct DeepSeekSummarizerTool {
    client: OpenAiCompatClient,
    model: String,
    max_length: usize,
}

impl DeepSeekSummarizerTool {
    pub fn new(client: OpenAiCompatClient, model: &str, max_length: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            max_length,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, ToolError> {
        let api_key = config.openrouter.api_key.as_deref().ok_or_else(|| {
            ToolError::NotConfigured(
                "OPENROUTER_API_KEY must be set for the DeepSeek summarizer".to_string(),
            )
        })?;
        let client = OpenAiCompatClient::new(&config.openrouter.base_url, api_key)?;
        Ok(Self::new(
            client,
            &config.openrouter.deepseek_model_id,
            config.summarizer.max_length,
        ))
    }
}

#[async_trait]
impl Tool for DeepSeekSummarizerTool {
    fn name(&self) -> &'static str {
        "deepseek_summarizer"
    }

    fn description(&self) -> &'static str {
        "Use this tool to summarize a piece of text using the DeepSeek R1 model via OpenRouter."
    }

    fn parameters(&self) -> Value {
        text_parameters()
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let text = text_argument(self.name(), &args)?;
        let request = CompletionRequest::new(
            &self.model,
            vec![
                ChatMessage::system(DEEPSEEK_SYSTEM_PROMPT),
                ChatMessage::user(summary_prompt(&text)),
            ],
        )
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_max_tokens(SUMMARY_MAX_TOKENS);

        let completion = self.client.complete(&request).await?;
        finish_summary(completion.content.as_deref(), self.max_length)
    }
}
