//! Company research: model-generated company profile for a staffing request.
//!
//! No lookup happens here: every field is the model's own text. The score is the
//! only field with a numeric contract and is coerced per `ScorePolicy`.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::analysis::error::AnalysisError;
use crate::analysis::flow::{as_object, required_text, run_flow, StructuredFlow};
use crate::analysis::language::PromptOptions;
use crate::analysis::outcome::{Outcome, SERVICE_UNAVAILABLE};
use crate::analysis::prompts::{render_osint_prompt, OSINT_SYSTEM};
use crate::llm_client::prompts::structured_system;
use crate::llm_client::CompletionProvider;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;
/// Score carried by the sentinel assessment. Outside the valid range on purpose.
pub const SENTINEL_SCORE: i64 = 0;

pub const DEFAULT_TARGET_ROLE: &str = "QA Automation Engineer";

/// Narrative assessment of the hiring company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAssessment {
    /// A summary of what the company does (website, sector, clients, products).
    pub summary: String,
    /// The type of company (startup / corporation / R&D center).
    #[serde(rename = "type")]
    pub company_type: String,
    /// Interesting facts about the company (AI, investments, hiring).
    pub interesting_facts: String,
    /// How attractive the company is for the target role, integer score from 1 to 5.
    #[schemars(range(min = 1, max = 5))]
    pub attractiveness_score: i64,
    /// The ideal candidate profile for this company: soft skills, hard skills,
    /// tasks, and familiar projects/technologies.
    pub ideal_candidate_profile: String,
}

/// What to do with a score outside 1..=5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScorePolicy {
    #[default]
    Clamp,
    Strict,
}

impl FromStr for ScorePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Ok(ScorePolicy::Clamp),
            "strict" => Ok(ScorePolicy::Strict),
            other => Err(format!(
                "unknown score policy '{other}' (expected clamp or strict)"
            )),
        }
    }
}

/// Input of the research flow. `normalized_data` is opaque context, never parsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchInput {
    pub company_name: String,
    pub normalized_data: String,
}

#[derive(Debug, Clone)]
pub struct OsintFlow {
    pub target_role: String,
    pub score_policy: ScorePolicy,
}

impl Default for OsintFlow {
    fn default() -> Self {
        Self {
            target_role: DEFAULT_TARGET_ROLE.to_string(),
            score_policy: ScorePolicy::default(),
        }
    }
}

impl OsintFlow {
    fn coerce_score(&self, raw: Option<&Value>) -> Result<i64, AnalysisError> {
        let score = match raw {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(round_finite)),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().and_then(round_finite),
            _ => None,
        }
        .ok_or_else(|| {
            AnalysisError::schema(
                Self::NAME,
                format!(
                    "attractivenessScore must be a number, got {}",
                    raw.map(Value::to_string)
                        .unwrap_or_else(|| "nothing".to_string())
                ),
            )
        })?;

        if (MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Ok(score);
        }

        match self.score_policy {
            ScorePolicy::Clamp => {
                let clamped = score.clamp(MIN_SCORE, MAX_SCORE);
                warn!(
                    flow = Self::NAME,
                    score, clamped, "attractivenessScore out of range, clamping"
                );
                Ok(clamped)
            }
            ScorePolicy::Strict => Err(AnalysisError::schema(
                Self::NAME,
                format!("attractivenessScore {score} is outside {MIN_SCORE}..={MAX_SCORE}"),
            )),
        }
    }
}

/// Rounds to the nearest integer; NaN and infinities are not scores.
fn round_finite(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.round() as i64)
}

impl StructuredFlow for OsintFlow {
    const NAME: &'static str = "osint_analysis";
    const TOOL_NAME: &'static str = "record_company_assessment";
    const TOOL_DESCRIPTION: &'static str =
        "Record the OSINT assessment of the hiring company.";

    type Input = ResearchInput;
    type Output = CompanyAssessment;

    fn check_input(&self, input: &ResearchInput) -> Result<(), AnalysisError> {
        if input.company_name.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "companyName cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn system_prompt(&self) -> String {
        structured_system(OSINT_SYSTEM)
    }

    fn render_prompt(&self, input: &ResearchInput, options: PromptOptions) -> String {
        render_osint_prompt(
            input.company_name.trim(),
            &input.normalized_data,
            &self.target_role,
            options,
        )
    }

    fn validate(&self, raw: Value) -> Result<CompanyAssessment, AnalysisError> {
        let mut raw = as_object(Self::NAME, raw)?;
        // Tolerate the wrapped shape: {"companyInfo": {...}}
        if raw.len() == 1 {
            if let Some(Value::Object(inner)) = raw.remove("companyInfo") {
                raw = inner;
            }
        }
        Ok(CompanyAssessment {
            summary: required_text(Self::NAME, &raw, "summary")?,
            company_type: required_text(Self::NAME, &raw, "type")?,
            interesting_facts: required_text(Self::NAME, &raw, "interestingFacts")?,
            attractiveness_score: self.coerce_score(raw.get("attractivenessScore"))?,
            ideal_candidate_profile: required_text(Self::NAME, &raw, "idealCandidateProfile")?,
        })
    }

    fn sentinel(&self) -> CompanyAssessment {
        CompanyAssessment {
            summary: SERVICE_UNAVAILABLE.to_string(),
            company_type: SERVICE_UNAVAILABLE.to_string(),
            interesting_facts: SERVICE_UNAVAILABLE.to_string(),
            attractiveness_score: SENTINEL_SCORE,
            ideal_candidate_profile: SERVICE_UNAVAILABLE.to_string(),
        }
    }
}

/// Produces a `CompanyAssessment` for a company given its normalized staffing data.
pub async fn perform_osint_analysis(
    provider: &dyn CompletionProvider,
    flow: &OsintFlow,
    input: &ResearchInput,
    options: PromptOptions,
) -> Result<Outcome<CompanyAssessment>, AnalysisError> {
    run_flow(provider, flow, input, options).await
}
