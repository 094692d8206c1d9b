//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::language::{FieldFormat, PromptOptions, ResponseLanguage};
use crate::analysis::osint::{perform_osint_analysis, CompanyAssessment, ResearchInput};
use crate::analysis::outcome::Outcome;
use crate::analysis::pipeline::{analyze_message, AnalysisReport};
use crate::analysis::staffing::{normalize_staffing_message, NormalizedStaffingRequest};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Optional per-request prompt overrides.
#[derive(Debug, Default, Deserialize)]
pub struct PromptOverrides {
    pub language: Option<ResponseLanguage>,
    pub format: Option<FieldFormat>,
}

impl PromptOverrides {
    fn apply(&self, defaults: PromptOptions) -> PromptOptions {
        defaults.with_overrides(self.language, self.format)
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    #[serde(flatten)]
    pub overrides: PromptOverrides,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    #[serde(flatten)]
    pub input: ResearchInput,
    #[serde(flatten)]
    pub overrides: PromptOverrides,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/staffing/normalize
///
/// Extracts structured hiring fields from a raw staffing message.
pub async fn handle_normalize(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Outcome<NormalizedStaffingRequest>>, AppError> {
    let options = request.overrides.apply(state.prompt_options);
    let outcome = normalize_staffing_message(state.provider.as_ref(), &request.message, options).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/osint/analyze
///
/// Generates a company assessment from a company name and normalized staffing data.
pub async fn handle_osint(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<Outcome<CompanyAssessment>>, AppError> {
    let options = request.overrides.apply(state.prompt_options);
    let outcome =
        perform_osint_analysis(state.provider.as_ref(), &state.osint, &request.input, options)
            .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/analyze
///
/// Full pipeline: normalize the message, then research the extracted company.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let options = request.overrides.apply(state.prompt_options);
    let report = analyze_message(
        state.provider.as_ref(),
        &state.osint,
        &request.message,
        options,
    )
    .await?;
    Ok(Json(report))
}
