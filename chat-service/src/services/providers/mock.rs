use super::{GenerationParams, ProviderError, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// Test provider that records prompts. A disabled provider always fails.
pub struct MockTextProvider {
    enabled: bool,
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::new(true)
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| format!("Mock response ({} chars of prompt)", prompt.len())))
    }
}
