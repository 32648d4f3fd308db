use crate::config::{AgentConfig, RetrieverConfig, SummarizerKind, ToolToggles};
use crate::error::{AgentError, ToolError};
use crate::llm::{ChatModel, OpenAiChatModel};
use crate::tools::{
    CapabilitiesTool, DeepSeekSummarizerTool, ExerciseSafetyValidatorTool, GeminiSummarizerTool,
    NutritionCalculatorTool, PineconeRetrieverTool, Tool, ToolRegistry, WorkoutPlanGeneratorTool,
};
use service_core::llm::{ChatMessage, ChatRole, OpenAiCompatClient, TokenUsage, ToolCall};
use std::path::Path;
use std::sync::Arc;

const FINAL_ANSWER_PROMPT: &str = "You have used all available steps. Based on the information gathered above, give your final answer to the original request now.";

/// Outcome of one agent run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub answer: String,
    /// Model calls made, including the forced final-answer call.
    pub steps: usize,
    pub tool_calls: usize,
    pub usage: TokenUsage,
    pub medical_query: bool,
    pub messages: Vec<ChatMessage>,
}

impl RunReport {
    pub fn tool_responses(&self) -> String {
        extract_tool_responses(&self.messages)
    }
}

pub struct FitnessAgent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: String,
    max_steps: usize,
    medical_detection: bool,
    medical_keywords: Vec<String>,
}

impl FitnessAgent {
    /// Validates the environment, connects the retriever and assembles the
    /// full tool set around the configured Groq model.
    pub async fn build(config: &AgentConfig, retriever_config_path: &Path) -> Result<Self, AgentError> {
        if !retriever_config_path.exists() {
            return Err(AgentError::ConfigFileNotFound(
                retriever_config_path.to_path_buf(),
            ));
        }

        let missing = config.missing_required();
        if !missing.is_empty() {
            return Err(AgentError::MissingEnvironment(missing.join(", ")));
        }
        let Some(groq_key) = config.model.groq_api_key.as_deref() else {
            return Err(AgentError::MissingEnvironment("GROQ_API_KEY".to_string()));
        };

        tracing::info!(path = %retriever_config_path.display(), "Loading retriever configuration");
        let retriever_config =
            RetrieverConfig::from_file(retriever_config_path)?.with_overrides(&config.pinecone);
        let retriever = PineconeRetrieverTool::connect(&retriever_config).await?;

        let client = OpenAiCompatClient::new(&config.model.base_url, groq_key)?;
        let model = OpenAiChatModel::new(client, &config.model.model_id);
        tracing::info!(
            model = %config.model.model_id,
            api_base = model.api_base(),
            "Initialized agent model"
        );

        let tools = assemble_tools(config.tools, Arc::new(retriever), build_summarizers(config));
        Ok(Self::new(Arc::new(model), tools, config))
    }

    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, config: &AgentConfig) -> Self {
        tracing::info!(tools = ?tools.names(), "Agent tools ready");
        Self {
            system_prompt: system_prompt(&tools),
            model,
            tools,
            max_steps: config.model.max_steps.max(1),
            medical_detection: config.safety.enable_medical_detection,
            medical_keywords: config.safety.medical_keywords.clone(),
        }
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.names()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn is_medical_query(&self, task: &str) -> bool {
        if !self.medical_detection {
            return false;
        }
        let task = task.to_lowercase();
        self.medical_keywords.iter().any(|k| task.contains(k.as_str()))
    }

    #[tracing::instrument(name = "agent.run", skip(self, task), fields(model = %self.model.model_id(), task_len = task.len()))]
    pub async fn run(&self, task: &str) -> Result<RunReport, AgentError> {
        let medical_query = self.is_medical_query(task);
        if medical_query {
            tracing::warn!(task, "Potential medical query detected");
        }

        let definitions = self.tools.definitions();
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(task),
        ];
        let mut usage = TokenUsage::default();
        let mut tool_calls = 0;

        for step in 1..=self.max_steps {
            let completion = self.model.complete(&messages, &definitions).await?;
            if let Some(u) = &completion.usage {
                usage.add(u);
            }

            if completion.tool_calls.is_empty() {
                let Some(answer) = non_blank(completion.content.as_deref()) else {
                    tracing::warn!(step, "Model returned neither tool calls nor an answer");
                    continue;
                };
                messages.push(ChatMessage::assistant(answer));
                tracing::info!(
                    step,
                    tool_calls,
                    total_tokens = usage.total_tokens,
                    "Agent produced an answer"
                );
                return Ok(RunReport {
                    answer: answer.to_string(),
                    steps: step,
                    tool_calls,
                    usage,
                    medical_query,
                    messages,
                });
            }

            messages.push(ChatMessage::assistant_tool_calls(
                completion.content.clone(),
                completion.tool_calls.clone(),
            ));
            for call in &completion.tool_calls {
                let observation = self.execute(call).await;
                messages.push(ChatMessage::tool_result(call, observation));
                tool_calls += 1;
            }
        }

        tracing::info!(max_steps = self.max_steps, "Step budget exhausted, requesting final answer");
        messages.push(ChatMessage::user(FINAL_ANSWER_PROMPT));
        let completion = self.model.complete(&messages, &[]).await?;
        if let Some(u) = &completion.usage {
            usage.add(u);
        }

        let answer = non_blank(completion.content.as_deref())
            .ok_or(AgentError::NoAnswer)?
            .to_string();
        messages.push(ChatMessage::assistant(answer.as_str()));

        Ok(RunReport {
            answer,
            steps: self.max_steps + 1,
            tool_calls,
            usage,
            medical_query,
            messages,
        })
    }

    /// Runs one tool call. Failures become an `Error: ...` observation.
    async fn execute(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        let result = match call.function.parsed_arguments() {
            Ok(args) => self.tools.dispatch(name, args).await,
            Err(e) => Err(ToolError::invalid_arguments(name, e.to_string())),
        };

        match result {
            Ok(output) => {
                tracing::debug!(tool = name, output_len = output.len(), "Tool call succeeded");
                output
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                format!("Error: {}", e)
            }
        }
    }
}

fn non_blank(content: Option<&str>) -> Option<&str> {
    content.map(str::trim).filter(|c| !c.is_empty())
}

/// Summarizers whose keys are present, primary first.
pub fn build_summarizers(config: &AgentConfig) -> Vec<Arc<dyn Tool>> {
    let order = match config.summarizer.primary {
        SummarizerKind::Gemini => [SummarizerKind::Gemini, SummarizerKind::DeepSeek],
        SummarizerKind::DeepSeek => [SummarizerKind::DeepSeek, SummarizerKind::Gemini],
    };

    let mut summarizers: Vec<Arc<dyn Tool>> = Vec::new();
    for kind in order {
        let built: Result<Arc<dyn Tool>, ToolError> = match kind {
            SummarizerKind::Gemini => {
                GeminiSummarizerTool::from_config(config).map(|t| Arc::new(t) as Arc<dyn Tool>)
            }
            SummarizerKind::DeepSeek => {
                DeepSeekSummarizerTool::from_config(config).map(|t| Arc::new(t) as Arc<dyn Tool>)
            }
        };
        match built {
            Ok(tool) => summarizers.push(tool),
            Err(e) => tracing::warn!(summarizer = %kind, error = %e, "Summarizer unavailable"),
        }
    }
    summarizers
}

/// Tool order: capabilities, retriever, the enabled fitness tools, then the
/// summarizers.
pub fn assemble_tools(
    toggles: ToolToggles,
    retriever: Arc<dyn Tool>,
    summarizers: Vec<Arc<dyn Tool>>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CapabilitiesTool));
    registry.register(retriever);
    if toggles.workout_generator {
        registry.register(Arc::new(WorkoutPlanGeneratorTool));
    }
    if toggles.nutrition_calculator {
        registry.register(Arc::new(NutritionCalculatorTool));
    }
    if toggles.safety_validator {
        registry.register(Arc::new(ExerciseSafetyValidatorTool));
    }
    for summarizer in summarizers {
        registry.register(summarizer);
    }
    registry
}

pub fn system_prompt(tools: &ToolRegistry) -> String {
    format!(
        "You are a comprehensive fitness and health assistant equipped with specialized tools.

Your capabilities include:
1. **Information Retrieval**: Search the fitness, muscle-building, fat loss, nutrition, supplements, recovery, injury and lifestyle knowledge base for evidence-based information
2. **Workout Planning**: Generate personalized workout plans based on goals and experience
3. **Nutrition Calculation**: Calculate caloric needs and macro splits
4. **Safety Validation**: Check exercise safety based on user conditions
5. **Summarization**: Provide concise summaries of complex information

You only have access to these tools:
{tool_descriptions}

IMPORTANT WORKFLOW RULES:
1. **ALWAYS use a two-step process for information queries**:
- FIRST: Use pinecone_vector_search_retriever to find relevant documents
- THEN: Use either gemini_summarizer or deepseek_summarizer to make the retrieved content user-friendly and to fill knowledge gaps if retrieval fails or is not informative enough

2. **When using the retriever**:
- The pinecone tool returns raw document chunks that may be technical or fragmented
- NEVER present raw Pinecone results directly to the user
- ALWAYS pass the retrieved documents to a summarizer for processing

3. **Choosing a summarizer**:
- Use gemini_summarizer for general fitness and nutrition topics
- Use deepseek_summarizer for more scientific content
- If one summarizer fails, try the other

4. **Example workflow for information queries**:
User: \"How do I build muscle with bad knees?\"
Step 1: Use pinecone_vector_search_retriever with query \"knee-friendly muscle building exercises\"
Step 2: Pass the retrieved documents to gemini_summarizer with the original user question
Step 3: Present the summarized, user-friendly response

5. **For other queries**:
- Always use exercise_safety_validator when users mention injuries or conditions
- Calculate nutrition needs before suggesting meal plans
- Generate workout plans that match the user's experience level

6. **Don't do**:
- Don't let the user see external links in the response.
- If you find any external links in the retrieved documents, do not include them in the final response.
- Don't present raw Pinecone results directly to the user
- Don't provide medical advice or diagnoses - always include disclaimers
- Don't answer anything outside the scope above; prompt the user to rephrase or ask a different question

REMEMBER:
- You are NOT a medical professional - always include disclaimers
- Raw Pinecone results are for YOUR use only - always summarize before presenting and make them user-friendly
- The summarizers will fill knowledge gaps and make content accessible
- Encourage users to consult certified professionals for personalized guidance
",
        tool_descriptions = tools.describe(),
    )
}

/// Joins the tool-role message contents as numbered observations.
pub fn extract_tool_responses(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role == ChatRole::Tool)
        .enumerate()
        .map(|(i, m)| {
            format!(
                "-------- OBSERVATION {} --------\n{}",
                i + 1,
                m.content.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::llm::FunctionCall;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: "what_can_i_do".to_string(),
                arguments: "{}".to_string(),
            },
        }
    }

    #[test]
    fn observations_are_numbered_from_one() {
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::tool_result(&call("a"), "First response"),
            ChatMessage::user("Question"),
            ChatMessage::tool_result(&call("b"), "Second response"),
        ];
        assert_eq!(
            extract_tool_responses(&messages),
            "-------- OBSERVATION 1 --------\nFirst response\n-------- OBSERVATION 2 --------\nSecond response"
        );
        assert_eq!(extract_tool_responses(&[ChatMessage::user("hi")]), "");
    }

    #[test]
    fn summarizers_without_keys_are_skipped() {
        assert!(build_summarizers(&AgentConfig::default()).is_empty());
    }

    #[test]
    fn primary_summarizer_comes_first() {
        let mut config = AgentConfig::default();
        config.gemini.api_key = Some("g-key".into());
        config.openrouter.api_key = Some("or-key".into());

        let names: Vec<_> = build_summarizers(&config).iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["deepseek_summarizer", "gemini_summarizer"]);

        config.summarizer.primary = SummarizerKind::Gemini;
        let names: Vec<_> = build_summarizers(&config).iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["gemini_summarizer", "deepseek_summarizer"]);
    }

    #[test]
    fn system_prompt_lists_tools() {
        let registry = assemble_tools(
            ToolToggles {
                workout_generator: false,
                nutrition_calculator: true,
                safety_validator: false,
            },
            Arc::new(CapabilitiesTool),
            Vec::new(),
        );
        let prompt = system_prompt(&registry);
        assert!(prompt.contains("- nutrition_calculator: Calculate daily caloric needs"));
        assert!(!prompt.contains("- workout_plan_generator:"));
        assert!(prompt.contains("NEVER present raw Pinecone results"));
    }
}
