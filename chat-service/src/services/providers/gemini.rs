use super::{GenerationParams, ProviderError, TextProvider};
use async_trait::async_trait;
use service_core::llm::GeminiClient;

pub struct GeminiTextProvider {
    client: GeminiClient,
}

impl GeminiTextProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: GeminiClient::new(api_key, model)?,
        })
    }

    pub fn from_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let response = self.client.generate(prompt, params).await?;

        tracing::debug!(
            model = %self.client.model(),
            input_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.completion_tokens,
            "Gemini reply generated"
        );

        response
            .text
            .ok_or_else(|| ProviderError::InvalidResponse("Gemini returned no text".to_string()))
    }
}
