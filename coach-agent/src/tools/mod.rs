//! The agent's tool set and the registry the agent loop dispatches through.
//!
//! Every tool takes a JSON object of arguments and returns Markdown or plain
//! text for the model to read. Tools are built once at startup and shared
//! immutably for the rest of the run.

pub mod capabilities;
pub mod nutrition;
pub mod retriever;
pub mod safety;
pub mod summarizer;
pub mod workout_plan;

use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::Value;
use service_core::llm::ToolDefinition;
use std::sync::Arc;

pub use capabilities::CapabilitiesTool;
pub use nutrition::NutritionCalculatorTool;
pub use retriever::{PineconeClient, PineconeRetrieverTool};
pub use safety::ExerciseSafetyValidatorTool;
pub use summarizer::{DeepSeekSummarizerTool, GeminiSummarizerTool};
pub use workout_plan::WorkoutPlanGeneratorTool;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool.
    fn name(&self) -> &'static str;

    /// Tells the model when the tool is useful.
    fn description(&self) -> &'static str;

    /// JSON Schema of the argument object.
    fn parameters(&self) -> Value;

    async fn call(&self, args: Value) -> Result<String, ToolError>;
}

/// Ordered set of tools. Order is preserved in the definitions sent to the
/// model.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. Returns `false` and keeps the existing one when the name
    /// is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> bool {
        if self.get(tool.name()).is_some() {
            tracing::warn!(tool = tool.name(), "Tool is already registered, skipping");
            return false;
        }
        tracing::debug!(tool = tool.name(), "Registering tool");
        self.tools.push(tool);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// OpenAI `tools` entries, one per registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// `- name: description` lines for the system prompt.
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tracing::instrument(skip(self, args))]
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.call(args).await
    }
}

/// Python-style title casing: a letter is upper-cased when it follows a
/// non-letter and lower-cased otherwise.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// `snake_case` → `Snake Case`.
pub(crate) fn humanize(s: &str) -> String {
    title_case(&s.replace('_', " "))
}

/// Rounds half to even, the way Python's `round()` does.
pub(crate) fn round_half_even(x: f64) -> i64 {
    x.round_ties_even() as i64
}

/// Whole numbers print without a fractional part.
pub(crate) fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.is_finite() {
        format!("{:.0}", x)
    } else {
        format!("{}", x)
    }
}

pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub(crate) fn required_str<'a>(tool: &str, args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid_arguments(tool, format!("'{}' must be a string", key)))
}

pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Reads a number, accepting numeric strings since models often quote them.
pub(crate) fn required_f64(tool: &str, args: &Value, key: &str) -> Result<f64, ToolError> {
    let value = args.get(key);
    value
        .and_then(Value::as_f64)
        .or_else(|| value.and_then(Value::as_str).and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ToolError::invalid_arguments(tool, format!("'{}' must be a number", key)))
}

pub(crate) fn required_i64(tool: &str, args: &Value, key: &str) -> Result<i64, ToolError> {
    let n = required_f64(tool, args, key)?;
    if n.fract() != 0.0 {
        return Err(ToolError::invalid_arguments(
            tool,
            format!("'{}' must be an integer", key),
        ));
    }
    Ok(n as i64)
}
