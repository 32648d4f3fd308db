use async_trait::async_trait;
use service_core::llm::{
    ChatMessage, Completion, CompletionRequest, OpenAiCompatClient, ProviderError, ToolDefinition,
};

/// The tool-calling model behind the agent loop.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// One chat-completions round. An empty `tools` list sends none.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion, ProviderError>;
}

/// A model hosted behind an OpenAI-compatible endpoint such as Groq.
pub struct OpenAiChatModel {
    client: OpenAiCompatClient,
    model_id: String,
}

impl OpenAiChatModel {
    pub fn new(client: OpenAiCompatClient, model_id: &str) -> Self {
        Self {
            client,
            model_id: model_id.to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion, ProviderError> {
        let request =
            CompletionRequest::new(&self.model_id, messages.to_vec()).with_tools(tools.to_vec());
        self.client.complete(&request).await
    }
}
