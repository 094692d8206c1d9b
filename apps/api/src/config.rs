use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::analysis::language::{FieldFormat, ResponseLanguage};
use crate::analysis::osint::{ScorePolicy, DEFAULT_TARGET_ROLE};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub response_language: ResponseLanguage,
    pub field_format: FieldFormat,
    /// Role the attractiveness score and candidate profile are written for.
    pub target_role: String,
    pub score_policy: ScorePolicy,
    pub llm_timeout_secs: u64,
    pub llm_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            response_language: parse_env("RESPONSE_LANGUAGE", ResponseLanguage::default())?,
            field_format: parse_env("FIELD_FORMAT", FieldFormat::default())?,
            target_role: std::env::var("TARGET_ROLE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TARGET_ROLE.to_string()),
            score_policy: parse_env("SCORE_POLICY", ScorePolicy::default())?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 1)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, std::env::var(key).ok().as_deref(), default)
}

/// Parses an optional raw value, falling back to `default` when unset or blank.
fn parse_value<T>(key: &str, raw: Option<&str>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|e| anyhow!("{key} has an invalid value '{value}': {e}")),
    }
}
