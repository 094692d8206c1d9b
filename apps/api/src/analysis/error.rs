use thiserror::Error;

use crate::llm_client::LlmError;

/// Failures of a structured flow. Transient provider unavailability is not here:
/// it becomes `Outcome::Degraded`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema violation in {flow}: {detail}")]
    SchemaViolation { flow: &'static str, detail: String },

    #[error("Completion provider failed: {0}")]
    Provider(#[from] LlmError),
}

impl AnalysisError {
    pub fn schema(flow: &'static str, detail: impl Into<String>) -> Self {
        AnalysisError::SchemaViolation {
            flow,
            detail: detail.into(),
        }
    }
}
