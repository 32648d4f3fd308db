use crate::error::AgentError;
use serde::Deserialize;
use service_core::config::{get_bool_env, get_env, get_optional_env, is_prod};
use service_core::error::AppError;
use service_core::llm::openai_compat::{GROQ_BASE_URL, OPENROUTER_BASE_URL};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const SERVICE_NAME: &str = "coach-agent";

pub const DEFAULT_MEDICAL_KEYWORDS: &str =
    "diagnose,prescription,medical condition,disease,symptom,medication,treatment";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub pinecone: PineconeConfig,
    pub gemini: GeminiConfig,
    pub openrouter: OpenRouterConfig,
    pub model: AgentModelConfig,
    pub summarizer: SummarizerConfig,
    pub safety: SafetyConfig,
    pub tools: ToolToggles,
}

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: Option<String>,
    pub index_name: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model_id: String,
}

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub deepseek_model_id: String,
}

/// The tool-calling model that drives the agent loop.
#[derive(Debug, Clone)]
pub struct AgentModelConfig {
    pub groq_api_key: Option<String>,
    pub model_id: String,
    pub base_url: String,
    pub max_steps: usize,
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub primary: SummarizerKind,
    pub max_length: usize,
}

#[derive(Debug, Clone)]
pub struct SafetyConfig {
    pub enable_medical_detection: bool,
    pub medical_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolToggles {
    pub workout_generator: bool,
    pub nutrition_calculator: bool,
    pub safety_validator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizerKind {
    Gemini,
    DeepSeek,
}

impl SummarizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummarizerKind::Gemini => "gemini",
            SummarizerKind::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for SummarizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummarizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(SummarizerKind::Gemini),
            "deepseek" => Ok(SummarizerKind::DeepSeek),
            other => Err(format!(
                "PRIMARY_SUMMARIZER must be one of: gemini, deepseek (got '{}')",
                other
            )),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
            pinecone: PineconeConfig {
                api_key: None,
                index_name: "coachak".to_string(),
                namespace: None,
            },
            gemini: GeminiConfig {
                api_key: None,
                model_id: "gemini-2.0-flash".to_string(),
            },
            openrouter: OpenRouterConfig {
                api_key: None,
                base_url: OPENROUTER_BASE_URL.to_string(),
                deepseek_model_id: "deepseek/deepseek-r1-0528:free".to_string(),
            },
            model: AgentModelConfig {
                groq_api_key: None,
                model_id: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
                base_url: GROQ_BASE_URL.to_string(),
                max_steps: 5,
            },
            summarizer: SummarizerConfig {
                primary: SummarizerKind::DeepSeek,
                max_length: 1024,
            },
            safety: SafetyConfig {
                enable_medical_detection: true,
                medical_keywords: parse_keywords(DEFAULT_MEDICAL_KEYWORDS),
            },
            tools: ToolToggles {
                workout_generator: true,
                nutrition_calculator: true,
                safety_validator: true,
            },
        }
    }
}

impl AgentConfig {
    /// Reads the agent settings from the environment after loading `.env`.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let is_prod = is_prod();
        let defaults = AgentConfig::default();

        let primary = get_env("PRIMARY_SUMMARIZER", Some("deepseek"), is_prod)?
            .parse::<SummarizerKind>()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let config = AgentConfig {
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            pinecone: PineconeConfig {
                api_key: get_optional_env("PINECONE_API_KEY"),
                index_name: get_env("PINECONE_INDEX_NAME", Some("coachak"), is_prod)?,
                namespace: get_optional_env("PINECONE_NAMESPACE"),
            },
            gemini: GeminiConfig {
                api_key: get_optional_env("GEMINI_API_KEY"),
                model_id: get_env("GEMINI_MODEL_ID", Some(&defaults.gemini.model_id), is_prod)?,
            },
            openrouter: OpenRouterConfig {
                api_key: get_optional_env("OPENROUTER_API_KEY"),
                base_url: get_env("OPENROUTER_BASE_URL", Some(OPENROUTER_BASE_URL), is_prod)?,
                deepseek_model_id: get_env(
                    "DEEPSEEK_MODEL_ID",
                    Some(&defaults.openrouter.deepseek_model_id),
                    is_prod,
                )?,
            },
            model: AgentModelConfig {
                groq_api_key: get_optional_env("GROQ_API_KEY"),
                model_id: get_env("AGENT_MODEL_ID", Some(&defaults.model.model_id), is_prod)?,
                base_url: get_env("AGENT_BASE_URL", Some(GROQ_BASE_URL), is_prod)?,
                max_steps: parse_number(
                    "MAX_AGENT_STEPS",
                    &get_env("MAX_AGENT_STEPS", Some("5"), is_prod)?,
                )?,
            },
            summarizer: SummarizerConfig {
                primary,
                max_length: parse_number(
                    "SUMMARY_MAX_LENGTH",
                    &get_env("SUMMARY_MAX_LENGTH", Some("1024"), is_prod)?,
                )?,
            },
            safety: SafetyConfig {
                enable_medical_detection: get_bool_env("ENABLE_MEDICAL_DETECTION", true),
                medical_keywords: parse_keywords(&get_env(
                    "MEDICAL_KEYWORDS",
                    Some(DEFAULT_MEDICAL_KEYWORDS),
                    is_prod,
                )?),
            },
            tools: ToolToggles {
                workout_generator: get_bool_env("ENABLE_WORKOUT_GENERATOR", true),
                nutrition_calculator: get_bool_env("ENABLE_NUTRITION_CALCULATOR", true),
                safety_validator: get_bool_env("ENABLE_SAFETY_VALIDATOR", true),
            },
        };

        if config.model.max_steps == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAX_AGENT_STEPS must be at least 1"
            )));
        }

        Ok(config)
    }

    /// Variables the agent cannot start without, paired with what they are for.
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.model.groq_api_key.is_none() {
            missing.push("GROQ_API_KEY (Groq API key for the tool-calling agent)".to_string());
        }
        if self.pinecone.api_key.is_none() {
            missing.push("PINECONE_API_KEY (Pinecone API key for vector search)".to_string());
        }
        missing
    }

    pub fn has_summarizer_key(&self) -> bool {
        self.gemini.api_key.is_some() || self.openrouter.api_key.is_some()
    }

    /// Logs the effective configuration. Call once the subscriber is installed.
    pub fn log_summary(&self) {
        if !self.has_summarizer_key() {
            tracing::warn!(
                "Neither GEMINI_API_KEY nor OPENROUTER_API_KEY is set; summarization will be unavailable"
            );
        }

        tracing::info!(
            pinecone_index = %self.pinecone.index_name,
            gemini_configured = self.gemini.api_key.is_some(),
            openrouter_configured = self.openrouter.api_key.is_some(),
            primary_summarizer = %self.summarizer.primary,
            agent_model = %self.model.model_id,
            max_steps = self.model.max_steps,
            medical_detection = self.safety.enable_medical_detection,
            workout_generator = self.tools.workout_generator,
            nutrition_calculator = self.tools.nutrition_calculator,
            safety_validator = self.tools.safety_validator,
            "Loaded agent configuration"
        );
    }
}

/// Splits a comma-separated keyword list, lower-cased with blanks removed.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse::<T>().map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("{} must be a number, got '{}'", key, raw))
    })
}

/// Vector-search parameters read from the retriever YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrieverConfig {
    #[serde(default)]
    pub pinecone_index_name: Option<String>,
    #[serde(default = "default_namespace")]
    pub pinecone_namespace: String,
    #[serde(default = "default_top_k")]
    pub k: usize,
    #[serde(default)]
    pub dimension: Option<u32>,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub pinecone_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieverFile {
    parameters: RetrieverConfig,
}

fn default_namespace() -> String {
    "__default__".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl RetrieverConfig {
    pub fn from_file(path: &Path) -> Result<Self, AgentError> {
        if !path.exists() {
            return Err(AgentError::ConfigFileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, AgentError> {
        let file: RetrieverFile = serde_yaml::from_str(raw)
            .map_err(|e| AgentError::Config(format!("Invalid retriever config: {}", e)))?;
        Ok(file.parameters)
    }

    /// Applies environment settings: the API key and namespace from the
    /// environment win, and the index name falls back to `PINECONE_INDEX_NAME`.
    pub fn with_overrides(mut self, pinecone: &PineconeConfig) -> Self {
        if let Some(key) = &pinecone.api_key {
            self.pinecone_api_key = Some(key.clone());
        }
        if let Some(namespace) = &pinecone.namespace {
            self.pinecone_namespace = namespace.clone();
        }
        if self.pinecone_index_name.is_none() {
            self.pinecone_index_name = Some(pinecone.index_name.clone());
        }
        self
    }

    pub fn index_name(&self) -> &str {
        self.pinecone_index_name.as_deref().unwrap_or_default()
    }
}
