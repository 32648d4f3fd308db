//! Text generation backends for assistant replies.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
pub use service_core::llm::{GenerationParams, ProviderError};

pub use gemini::GeminiTextProvider;
pub use mock::MockTextProvider;

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, ProviderError>;
}
