//! Test doubles: a scripted chat model and fixed-output tools.

#![allow(dead_code)]

use async_trait::async_trait;
use coach_agent::agent::{assemble_tools, FitnessAgent};
use coach_agent::config::AgentConfig;
use coach_agent::llm::ChatModel;
use coach_agent::tools::Tool;
use coach_agent::ToolError;
use serde_json::{json, Value};
use service_core::llm::{
    ChatMessage, Completion, FunctionCall, ProviderError, TokenUsage, ToolCall, ToolDefinition,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const RETRIEVER_OUTPUT: &str = "<search_results>\n<document id=\"1\">Squat with a neutral spine.</document>\n</search_results>";

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Replays queued completions in order and records what it was sent.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Completion>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.function.name.clone()).collect(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::InvalidResponse("script exhausted".to_string()))
    }
}

fn usage() -> Option<TokenUsage> {
    Some(TokenUsage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

pub fn answer(text: &str) -> Completion {
    Completion {
        content: Some(text.to_string()),
        tool_calls: Vec::new(),
        usage: usage(),
        finish_reason: Some("stop".to_string()),
    }
}

pub fn empty_reply() -> Completion {
    Completion {
        content: None,
        tool_calls: Vec::new(),
        usage: None,
        finish_reason: Some("stop".to_string()),
    }
}

pub fn raw_tool_call(id: &str, name: &str, arguments: &str) -> Completion {
    Completion {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }],
        usage: usage(),
        finish_reason: Some("tool_calls".to_string()),
    }
}

pub fn tool_call(id: &str, name: &str, args: Value) -> Completion {
    raw_tool_call(id, name, &args.to_string())
}

/// Stands in for the Pinecone retriever.
pub struct FakeRetriever;

#[async_trait]
impl Tool for FakeRetriever {
    fn name(&self) -> &'static str {
        "pinecone_vector_search_retriever"
    }

    fn description(&self) -> &'static str {
        "Use this tool to search and retrieve relevant documents."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]})
    }

    async fn call(&self, _args: Value) -> Result<String, ToolError> {
        Ok(RETRIEVER_OUTPUT.to_string())
    }
}

pub fn test_config(max_steps: usize) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.model.max_steps = max_steps;
    config
}

pub fn agent_with(model: Arc<ScriptedModel>, config: &AgentConfig) -> FitnessAgent {
    let tools = assemble_tools(config.tools, Arc::new(FakeRetriever), Vec::new());
    FitnessAgent::new(model, tools, config)
}
