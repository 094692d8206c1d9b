//! Structured flow. Both analysis steps share one shape:
//! template a prompt, ask the provider for schema-constrained JSON, validate it,
//! and degrade to a sentinel record when the provider is temporarily down.

use schemars::{schema_for, JsonSchema};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::analysis::error::AnalysisError;
use crate::analysis::language::PromptOptions;
use crate::analysis::outcome::Outcome;
use crate::llm_client::{CompletionProvider, CompletionRequest, ToolSpec};

pub trait StructuredFlow: Send + Sync {
    /// Flow name used in logs and schema-violation errors.
    const NAME: &'static str;
    /// Name of the forced tool the model must call.
    const TOOL_NAME: &'static str;
    const TOOL_DESCRIPTION: &'static str;

    type Input: ?Sized + Sync;
    type Output: JsonSchema + Send;

    /// Rejects input the flow must never send to the provider.
    fn check_input(&self, input: &Self::Input) -> Result<(), AnalysisError>;

    fn system_prompt(&self) -> String;

    fn render_prompt(&self, input: &Self::Input, options: PromptOptions) -> String;

    /// Coerces the provider's raw JSON into the output record, or fails.
    fn validate(&self, raw: Value) -> Result<Self::Output, AnalysisError>;

    /// Fully-populated record returned when the provider is unavailable.
    fn sentinel(&self) -> Self::Output;

    fn output_schema() -> Value {
        output_schema::<Self::Output>()
    }
}

/// JSON schema for `T`, trimmed to what a tool `input_schema` accepts.
pub fn output_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

/// Runs one flow against the provider.
///
/// Transient unavailability becomes `Outcome::Degraded`; every other provider
/// error and every schema violation propagates.
pub async fn run_flow<F: StructuredFlow>(
    provider: &dyn CompletionProvider,
    flow: &F,
    input: &F::Input,
    options: PromptOptions,
) -> Result<Outcome<F::Output>, AnalysisError> {
    flow.check_input(input)?;

    let request = CompletionRequest {
        system: flow.system_prompt(),
        prompt: flow.render_prompt(input, options),
        tool: ToolSpec {
            name: F::TOOL_NAME.to_string(),
            description: F::TOOL_DESCRIPTION.to_string(),
            input_schema: F::output_schema(),
        },
    };

    debug!(
        flow = F::NAME,
        language = %options.language,
        prompt_len = request.prompt.len(),
        "Sending structured completion request"
    );

    match provider.complete(&request).await {
        Ok(raw) => {
            let record = flow.validate(raw)?;
            info!(flow = F::NAME, "Structured completion validated");
            Ok(Outcome::Success { record })
        }
        Err(e) if e.is_transient_unavailability() => {
            error!(flow = F::NAME, error = %e, "Service Unavailable error, returning sentinel record");
            Ok(Outcome::Degraded {
                reason: e.to_string(),
                record: flow.sentinel(),
            })
        }
        Err(e) => Err(AnalysisError::Provider(e)),
    }
}

/// Reads a required string field: present, a string, non-blank after trimming.
pub(crate) fn required_text(
    flow: &'static str,
    raw: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<String, AnalysisError> {
    match raw.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(AnalysisError::schema(
            flow,
            format!("required field '{field}' is empty"),
        )),
        Some(Value::Null) | None => Err(AnalysisError::schema(
            flow,
            format!("missing required field '{field}'"),
        )),
        Some(other) => Err(AnalysisError::schema(
            flow,
            format!("field '{field}' must be a string, got {other}"),
        )),
    }
}

/// Reads an optional string field. Absent, null, and blank all mean "not stated".
pub(crate) fn optional_text(
    flow: &'static str,
    raw: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Option<String>, AnalysisError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(AnalysisError::schema(
            flow,
            format!("field '{field}' must be a string, got {other}"),
        )),
    }
}

/// The provider's result must be a JSON object.
pub(crate) fn as_object(
    flow: &'static str,
    raw: Value,
) -> Result<serde_json::Map<String, Value>, AnalysisError> {
    match raw {
        Value::Object(map) => Ok(map),
        other => Err(AnalysisError::schema(
            flow,
            format!("expected a JSON object, got {other}"),
        )),
    }
}
