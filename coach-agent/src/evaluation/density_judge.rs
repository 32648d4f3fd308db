use super::{AnswerJudge, Judgement};
use crate::config::AgentConfig;
use crate::error::JudgeError;
use async_trait::async_trait;
use serde_json::Value;
use service_core::llm::{ChatMessage, CompletionRequest, OpenAiCompatClient};

const JUDGE_SYSTEM_PROMPT: &str =
    "You are an expert judge evaluating text quality. Always respond with valid JSON.";
const JUDGE_TEMPERATURE: f32 = 0.3;
const JUDGE_MAX_TOKENS: u32 = 256;

pub fn judge_prompt(input: &str, output: &str) -> String {
    format!(
        r#"You are an impartial expert judge. Evaluate the quality of a given answer to an instruction based on how long the answer it is.

How to decide whether the lengths of the answer is appropriate:
1 (Poor): Too short, does not answer the question OR too long, it contains too much noise and unrequired information, where the answer could be more concise.
2 (Good): Good length balance of the answer, but the answer is still too short OR too long.
3 (Excellent): The length of the answer is appropriate, it answers the question and is not too long or too short.

Example of bad answer that is too short:
<answer>
LangChain, LlamaIndex, Haystack
</answer>

Example of bad answer that is too long:
<answer>
LangChain is a powerful and versatile framework designed specifically for building sophisticated LLM applications. It provides comprehensive abstractions for essential components like prompting, memory management, agent behaviors, and chain orchestration. The framework boasts an impressive ecosystem with extensive integrations across various tools and services, making it highly flexible for diverse use cases. However, this extensive functionality comes with a steeper learning curve that might require dedicated time to master.

LlamaIndex (which was formerly known as GPTIndex) has carved out a specialized niche in the LLM tooling landscape, focusing primarily on data ingestion and advanced indexing capabilities for Large Language Models. It offers a rich set of sophisticated mechanisms to structure and query your data, including vector stores for semantic similarity search, keyword indices for traditional text matching, and tree indices for hierarchical data organization. While it particularly shines in Retrieval-Augmented Generation (RAG) applications, its comprehensive feature set might be excessive for more straightforward implementation needs.

Haystack stands out as a robust end-to-end framework that places particular emphasis on question-answering systems and semantic search capabilities. It provides a comprehensive suite of document processing tools and comes equipped with production-ready pipelines that can be deployed with minimal configuration. The framework includes advanced features like multi-stage retrieval, document ranking, and reader-ranker architectures. While these capabilities make it powerful for complex information retrieval tasks, new users might find the initial configuration and architecture decisions somewhat challenging to navigate.

Each of these frameworks brings unique strengths to the table while sharing some overlapping functionality. The choice between them often depends on specific use cases, technical requirements, and team expertise. LangChain offers the broadest general-purpose toolkit, LlamaIndex excels in data handling and RAG, while Haystack provides the most streamlined experience for question-answering systems.
</answer>

Example of excellent answer that is appropriate:
<answer>
1. LangChain is a powerful framework for building LLM applications that provides abstractions for prompting, memory, agents, and chains. It has extensive integrations with various tools and services, making it highly flexible but potentially complex to learn.
2. LlamaIndex specializes in data ingestion and indexing for LLMs, offering sophisticated ways to structure and query your data through vector stores, keyword indices, and tree indices. It excels at RAG applications but may be overkill for simpler use cases.
3. Haystack is an end-to-end framework focused on question-answering and semantic search, with strong document processing capabilities and ready-to-use pipelines. While powerful, its learning curve can be steep for beginners.
</answer>

Instruction: {input}

Answer: {output}

Provide your evaluation in valid JSON format with exactly this structure:
{{
    "score": <integer between 1 and 3>,
    "reason": "<explanation of your scoring decision>"
}}

Be objective and focus specifically on whether the length and density of the answer is appropriate for the question asked."#
    )
}

/// Scores whether an answer's length and density fit the instruction,
/// using DeepSeek through OpenRouter.
pub struct SummaryDensityJudge {
    client: OpenAiCompatClient,
    model: String,
}

impl SummaryDensityJudge {
    pub fn new(client: OpenAiCompatClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, JudgeError> {
        let api_key = config.openrouter.api_key.as_deref().ok_or_else(|| {
            JudgeError::NotConfigured(
                "OpenRouter API key required for DeepSeek judge".to_string(),
            )
        })?;
        let client = OpenAiCompatClient::new(&config.openrouter.base_url, api_key)?;
        Ok(Self::new(client, &config.openrouter.deepseek_model_id))
    }
}

#[async_trait]
impl AnswerJudge for SummaryDensityJudge {
    fn name(&self) -> &str {
        "summary_density_judge"
    }

    async fn judge(&self, input: &str, output: &str) -> Result<Judgement, JudgeError> {
        let request = CompletionRequest::new(
            &self.model,
            vec![
                ChatMessage::system(JUDGE_SYSTEM_PROMPT),
                ChatMessage::user(judge_prompt(input, output)),
            ],
        )
        .with_temperature(JUDGE_TEMPERATURE)
        .with_max_tokens(JUDGE_MAX_TOKENS);

        let completion = self.client.complete(&request).await?;
        parse_judgement(completion.content.as_deref().unwrap_or_default())
    }
}

/// Parses `{"score", "reason"}` judge output, tolerating a ```json fence.
pub fn parse_judgement(content: &str) -> Result<Judgement, JudgeError> {
    let mut body = content.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    let parsed: Value = serde_json::from_str(body.trim()).map_err(|e| JudgeError::Parse {
        message: e.to_string(),
        output: body.to_string(),
    })?;

    let score = match parsed.get("score") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
        None => return Err(JudgeError::InvalidScore("missing field 'score'".to_string())),
    }
    .ok_or_else(|| JudgeError::InvalidScore(format!("not an integer: {}", parsed["score"])))?;

    if !(1..=3).contains(&score) {
        return Err(JudgeError::InvalidScore(format!("Invalid score value: {}", score)));
    }

    let reason = parsed
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or("No reason provided")
        .to_string();

    Ok(Judgement {
        score: score as u8,
        value: (score - 1) as f64 / 2.0,
        reason,
    })
}
