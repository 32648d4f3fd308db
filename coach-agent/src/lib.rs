//! coach-agent: a tool-calling fitness assistant.
//!
//! The agent is driven by a hosted OpenAI-compatible model and is given a
//! fixed tool set: a capability catalogue, a vector-search retriever, three
//! formula-driven fitness tools and two LLM summarizers.
pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod llm;
pub mod tools;

pub use agent::{extract_tool_responses, FitnessAgent, RunReport};
pub use config::AgentConfig;
pub use error::{AgentError, JudgeError, ToolError};
