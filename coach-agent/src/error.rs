use service_core::llm::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a single tool call. The agent never propagates these;
/// they are rendered as `Error: <message>` observations for the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// Input that parsed but is out of range. Displayed verbatim.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Vector search error: {0}")]
    Search(String),

    #[error("Tool not configured: {0}")]
    NotConfigured(String),
}

impl ToolError {
    pub fn invalid_arguments(tool: &str, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("Missing required environment variables: {0}")]
    MissingEnvironment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool setup failed: {0}")]
    ToolSetup(#[from] ToolError),

    #[error("Model error: {0}")]
    Model(#[from] ProviderError),

    #[error("Model returned no final answer")]
    NoAnswer,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Judge not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to get judgment: {0}")]
    Provider(#[from] ProviderError),

    #[error("Failed to parse judge output as JSON: {message}\nOutput was: {output}")]
    Parse { message: String, output: String },

    #[error("Invalid score format: {0}")]
    InvalidScore(String),
}
