use serde::Deserialize;
use service_core::config::{self as core_config, get_bool_env, get_env, get_optional_env};
use service_core::error::AppError;

pub const SERVICE_NAME: &str = "chat-service";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub project_name: String,
    pub version: String,
    pub debug: bool,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub session_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        Ok(ChatConfig {
            common,
            project_name: get_env("PROJECT_NAME", Some("Chat Microservice"), is_prod)?,
            version: env!("CARGO_PKG_VERSION").to_string(),
            debug: get_bool_env("DEBUG", debug_default(is_prod)),
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("chat_microservice"), is_prod)?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://localhost:6379"), is_prod)?,
                session_ttl_seconds: parse_number(
                    "REDIS_SESSION_TTL_SECONDS",
                    &get_env("REDIS_SESSION_TTL_SECONDS", Some("3600"), is_prod)?,
                )?,
            },
            jwt: JwtConfig {
                secret_key: get_env("SECRET_KEY", None, is_prod)?,
                access_token_expire_minutes: parse_number(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    &get_env("ACCESS_TOKEN_EXPIRE_MINUTES", Some("30"), is_prod)?,
                )?,
            },
            gemini: GeminiConfig {
                api_key: get_env("GEMINI_API_KEY", None, is_prod)?,
                model: get_env("GEMINI_MODEL", Some("gemini-2.0-flash"), is_prod)?,
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} must be a number, got '{}': {}", key, raw, e))
    })
}

/// Debug routes stay off in prod unless `DEBUG` is set explicitly.
fn debug_default(is_prod: bool) -> bool {
    !is_prod
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_values() {
        let ttl: u64 = parse_number("REDIS_SESSION_TTL_SECONDS", " 3600 ").unwrap();
        assert_eq!(ttl, 3600);
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = parse_number::<u64>("REDIS_SESSION_TTL_SECONDS", "an hour").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn debug_defaults_on_outside_prod() {
        assert!(debug_default(false));
        assert!(!debug_default(true));
    }
}
