/// LLM Client: the single point of entry for all Claude API calls in SourceWise.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Flows depend on the `CompletionProvider` trait; `LlmClient` is its production backend.
///
/// Model: claude-sonnet-4-5 (hardcoded; do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub mod scripted;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in SourceWise.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
/// Anthropic's "overloaded" status. Treated the same as 503.
const STATUS_OVERLOADED: u16 = 529;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("{status} Service Unavailable: {message}")]
    Unavailable { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the provider is temporarily down and the caller may degrade
    /// instead of failing. Timeouts and rate limits do not count.
    pub fn is_transient_unavailability(&self) -> bool {
        matches!(self, LlmError::Unavailable { .. })
    }
}

/// Tool definition used to pin the model's answer to a JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A schema-constrained completion request: prompt in, JSON matching `tool.input_schema` out.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub tool: ToolSpec,
}

/// `complete(prompt, outputSchema) -> structuredResult`.
///
/// Carried in `AppState` as `Arc<dyn CompletionProvider>` so flows never see
/// provider-specific request/response formats.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Value, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    tools: [&'a ToolSpec; 1],
    tool_choice: ToolChoice<'a>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolChoice<'a> {
    Tool { name: &'a str },
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    pub name: Option<String>,
    pub input: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }

    /// Extracts the input of the `tool_use` block for the named tool.
    pub fn tool_input(&self, tool_name: &str) -> Option<&Value> {
        self.content
            .iter()
            .filter(|b| b.block_type == "tool_use")
            .find(|b| b.name.as_deref() == Some(tool_name))
            .and_then(|b| b.input.as_ref())
    }

    /// Structured result of a forced tool call. Falls back to parsing the text
    /// block as JSON when the model answered in prose.
    pub fn structured(&self, tool_name: &str) -> Result<Value, LlmError> {
        if let Some(input) = self.tool_input(tool_name) {
            return Ok(input.clone());
        }
        let text = self.text().ok_or(LlmError::EmptyContent)?;
        serde_json::from_str(strip_json_fences(text)).map_err(LlmError::Parse)
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Transport settings for `LlmClient`.
#[derive(Debug, Clone, Copy)]
pub struct LlmSettings {
    pub timeout: Duration,
    /// Total attempts per call, including the first. 1 disables retries.
    pub max_attempts: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_attempts: 1,
        }
    }
}

/// The Anthropic Messages API backend.
/// Wraps the API with timeout, optional retry, and forced-tool structured output.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(api_key: String, settings: LlmSettings) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(settings.timeout).build()?,
            api_key,
            settings,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries only on 429 (rate limit) and 5xx/529 responses, with exponential
    /// backoff while attempts remain. Timeouts and transport errors return at once.
    async fn call(&self, request: &CompletionRequest) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: &request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
            tools: [&request.tool],
            tool_choice: ToolChoice::Tool {
                name: &request.tool.name,
            },
        };

        let max_attempts = self.settings.max_attempts.max(1);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    return Err(LlmError::Timeout {
                        secs: self.settings.timeout.as_secs(),
                    });
                }
                Err(e) => return Err(LlmError::Http(e)),
            };

            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let error = classify_status(status, body);
                if is_retryable(&error) {
                    warn!("LLM API returned {}: {}", status, error);
                    last_error = Some(error);
                    continue;
                }
                return Err(error);
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(match last_error {
            Some(LlmError::Api { status: 429, .. }) | None => LlmError::RateLimited {
                retries: max_attempts - 1,
            },
            Some(e) => e,
        })
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Value, LlmError> {
        let response = self.call(request).await?;
        response.structured(&request.tool.name)
    }
}

/// Only rate limits and server-side failures are worth another attempt.
fn is_retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Api { status, .. } => *status == 429 || (500..600).contains(status),
        LlmError::Unavailable { .. } => true,
        _ => false,
    }
}

/// Maps a non-success status and its body onto an `LlmError`.
fn classify_status(status: StatusCode, body: String) -> LlmError {
    // Try to parse error message
    let message = serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    match status.as_u16() {
        503 | STATUS_OVERLOADED => LlmError::Unavailable {
            status: status.as_u16(),
            message,
        },
        code => LlmError::Api {
            status: code,
            message,
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    stripped
        .trim_start()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(stripped.trim_start())
}
