use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;
use crate::matching::engine::Threshold;

const DEFAULT_EMBEDDING_MODEL: &str = "intfloat/multilingual-e5-large";
/// e5 models expect every input to carry an instruction marker.
const DEFAULT_EMBEDDING_PREFIX: &str = "query: ";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_prefix: String,
    pub embedding_batch_size: usize,
    pub redis_url: Option<String>,
    pub profile_cache_ttl_secs: u64,
    pub match_threshold: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let match_threshold = parse_value("MATCH_THRESHOLD", optional_env("MATCH_THRESHOLD"), 0.5)?;
        Threshold::new(match_threshold).context("MATCH_THRESHOLD must be within [0, 1]")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_url: require_env("EMBEDDING_URL")?,
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            // Not trimmed: the trailing space is part of the marker.
            embedding_prefix: std::env::var("EMBEDDING_PREFIX")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_PREFIX.to_string()),
            embedding_batch_size: parse_value(
                "EMBEDDING_BATCH_SIZE",
                optional_env("EMBEDDING_BATCH_SIZE"),
                16,
            )?,
            redis_url: optional_env("REDIS_URL"),
            profile_cache_ttl_secs: parse_value(
                "PROFILE_CACHE_TTL_SECS",
                optional_env("PROFILE_CACHE_TTL_SECS"),
                86_400,
            )?,
            match_threshold,
            port: parse_value("PORT", optional_env("PORT"), 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has invalid value '{raw}'")),
    }
}


#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/matcher_test".to_string(),
        anthropic_api_key: "test-key".to_string(),
        llm_model: DEFAULT_MODEL.to_string(),
        embedding_url: "http://localhost:8081/v1/embeddings".to_string(),
        embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        embedding_api_key: None,
        embedding_prefix: DEFAULT_EMBEDDING_PREFIX.to_string(),
        embedding_batch_size: 16,
        redis_url: None,
        profile_cache_ttl_secs: 86_400,
        match_threshold: 0.5,
        port: 8080,
        rust_log: "info".to_string(),
    }
}
