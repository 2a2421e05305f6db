use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::assistant::ranker::{RankerConfig, ScoringWeights};
use crate::assistant::session::AssistantSettings;
use crate::llm_client::GenerationOptions;

const DEFAULT_GENERATION_URL: &str = "https://api-inference.huggingface.co/models/distilgpt2";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub content_dir: PathBuf,
    pub static_dir: PathBuf,
    pub content_cache_ttl: Duration,
    pub generation_url: String,
    pub generation_api_key: Option<String>,
    pub generation_model: String,
    pub max_sessions: usize,
    pub assistant: AssistantSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = GenerationOptions::default();
        let generation = GenerationOptions {
            temperature: parse_env("GEN_TEMPERATURE", defaults.temperature)?,
            top_p: parse_env("GEN_TOP_P", defaults.top_p)?,
            top_k: parse_env("GEN_TOP_K", defaults.top_k)?,
            repetition_penalty: parse_env("GEN_REPETITION_PENALTY", defaults.repetition_penalty)?,
            no_repeat_ngram_size: parse_env(
                "GEN_NO_REPEAT_NGRAM_SIZE",
                defaults.no_repeat_ngram_size,
            )?,
            max_new_tokens: parse_env("GEN_MAX_NEW_TOKENS", defaults.max_new_tokens)?,
            eos_token_id: parse_env("GEN_EOS_TOKEN_ID", defaults.eos_token_id)?,
            pad_token_id: parse_env("GEN_EOS_TOKEN_ID", defaults.pad_token_id)?,
            ..defaults
        };

        let weights = match optional_env("SCORING_WEIGHTS") {
            Some(raw) => serde_json::from_str::<ScoringWeights>(&raw)
                .context("SCORING_WEIGHTS must be a JSON object of ranker weights")?,
            None => ScoringWeights::default(),
        };
        let enumeration_triggers = optional_env("ENUMERATION_TRIGGERS")
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| RankerConfig::default().enumeration_triggers);

        Ok(Config {
            port: parse_env("PORT", 3000)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            content_dir: optional_env("CONTENT_DIR")
                .unwrap_or_else(|| "portfolio-content".to_string())
                .into(),
            static_dir: optional_env("STATIC_DIR")
                .unwrap_or_else(|| "public".to_string())
                .into(),
            content_cache_ttl: Duration::from_secs(parse_env("CONTENT_CACHE_TTL_SECS", 300)?),
            generation_url: optional_env("GENERATION_URL")
                .unwrap_or_else(|| DEFAULT_GENERATION_URL.to_string()),
            generation_api_key: optional_env("GENERATION_API_KEY"),
            generation_model: optional_env("GENERATION_MODEL")
                .unwrap_or_else(|| "distilgpt2".to_string()),
            max_sessions: parse_env("MAX_SESSIONS", 1000)?,
            assistant: AssistantSettings {
                assistant_name: optional_env("ASSISTANT_NAME")
                    .unwrap_or_else(|| "Studio DATA".to_string()),
                ranker: RankerConfig {
                    weights,
                    enumeration_triggers,
                },
                generation,
                generation_timeout: Duration::from_secs(parse_env("GENERATION_TIMEOUT_SECS", 60)?),
            },
        })
    }
}

/// Unset and empty variables both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
