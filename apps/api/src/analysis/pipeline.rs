//! Analysis pipeline: staffing extraction, then company research, strictly in that order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::error::AnalysisError;
use crate::analysis::flow::StructuredFlow;
use crate::analysis::language::PromptOptions;
use crate::analysis::osint::{perform_osint_analysis, CompanyAssessment, OsintFlow, ResearchInput};
use crate::analysis::outcome::Outcome;
use crate::analysis::staffing::{normalize_staffing_message, NormalizedStaffingRequest};
use crate::llm_client::CompletionProvider;

pub const SKIPPED_AFTER_DEGRADED_EXTRACTION: &str = "skipped: staffing extraction degraded";

/// Both flow results for one staffing message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub normalized: Outcome<NormalizedStaffingRequest>,
    pub assessment: Outcome<CompanyAssessment>,
}

/// Runs extraction, then research on the extracted company.
///
/// Research is only attempted after a successful extraction; a degraded
/// extraction yields a degraded assessment without a second provider call.
pub async fn analyze_message(
    provider: &dyn CompletionProvider,
    osint: &OsintFlow,
    message: &str,
    options: PromptOptions,
) -> Result<AnalysisReport, AnalysisError> {
    let analysis_id = Uuid::new_v4();
    let span = info_span!("analysis", %analysis_id);

    async move {
        let normalized = normalize_staffing_message(provider, message, options).await?;

        let assessment = match normalized.success() {
            Some(record) => {
                let input = ResearchInput {
                    company_name: record.company_name.clone(),
                    normalized_data: record.to_context(),
                };
                perform_osint_analysis(provider, osint, &input, options).await?
            }
            None => Outcome::Degraded {
                reason: SKIPPED_AFTER_DEGRADED_EXTRACTION.to_string(),
                record: osint.sentinel(),
            },
        };

        info!(
            extraction_degraded = normalized.is_degraded(),
            research_degraded = assessment.is_degraded(),
            "Analysis finished"
        );

        Ok(AnalysisReport {
            analysis_id,
            generated_at: Utc::now(),
            normalized,
            assessment,
        })
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::outcome::SERVICE_UNAVAILABLE;
    use crate::llm_client::scripted::ScriptedProvider;
    use crate::llm_client::LlmError;
    use serde_json::json;

    const ACME_MESSAGE: &str = "Acme Corp needs a Senior QA Automation Engineer, \
        React/TypeScript stack, 6-month project, team of 4, English B2+";

    fn staffing_reply() -> serde_json::Value {
        json!({
            "companyName": "Acme Corp",
            "role": "Senior QA Automation Engineer",
            "techStack": "React/TypeScript",
            "projectDuration": "6 months",
            "teamSize": "4",
            "englishLevel": "B2+",
            "relevantInfo": "Senior level"
        })
    }

    fn assessment_reply() -> serde_json::Value {
        json!({
            "summary": "Acme Corp makes frontend tooling.",
            "type": "startup",
            "interestingFacts": "Growing QA team.",
            "attractivenessScore": 4,
            "idealCandidateProfile": "Cypress or Playwright with TypeScript."
        })
    }

    #[tokio::test]
    async fn test_end_to_end_feeds_extraction_into_research() {
        let provider = ScriptedProvider::new(vec![Ok(staffing_reply()), Ok(assessment_reply())]);

        let report = analyze_message(
            &provider,
            &OsintFlow::default(),
            ACME_MESSAGE,
            PromptOptions::default(),
        )
        .await
        .unwrap();

        let normalized = report.normalized.success().unwrap();
        assert_eq!(normalized.company_name, "Acme Corp");
        let assessment = report.assessment.success().unwrap();
        assert_eq!(assessment.attractiveness_score, 4);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].prompt.contains("Company name: Acme Corp"));
        assert!(requests[1].prompt.contains(&normalized.to_context()));
    }

    #[tokio::test]
    async fn test_degraded_extraction_skips_research() {
        let provider = ScriptedProvider::new(vec![Err(ScriptedProvider::unavailable())]);

        let report = analyze_message(
            &provider,
            &OsintFlow::default(),
            ACME_MESSAGE,
            PromptOptions::default(),
        )
        .await
        .unwrap();

        assert!(report.normalized.is_degraded());
        match &report.assessment {
            Outcome::Degraded { reason, record } => {
                assert_eq!(reason, SKIPPED_AFTER_DEGRADED_EXTRACTION);
                assert_eq!(record.summary, SERVICE_UNAVAILABLE);
                assert_eq!(record.attractiveness_score, 0);
            }
            other => panic!("expected degraded assessment, got {other:?}"),
        }
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_degraded_research_keeps_extraction() {
        let provider = ScriptedProvider::new(vec![
            Ok(staffing_reply()),
            Err(ScriptedProvider::unavailable()),
        ]);

        let report = analyze_message(
            &provider,
            &OsintFlow::default(),
            ACME_MESSAGE,
            PromptOptions::default(),
        )
        .await
        .unwrap();

        assert!(!report.normalized.is_degraded());
        assert!(report.assessment.is_degraded());
    }

    #[tokio::test]
    async fn test_research_failure_fails_the_whole_analysis() {
        let provider = ScriptedProvider::new(vec![
            Ok(staffing_reply()),
            Err(LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            }),
        ]);

        let result = analyze_message(
            &provider,
            &OsintFlow::default(),
            ACME_MESSAGE,
            PromptOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(AnalysisError::Provider(_))));
    }

    #[tokio::test]
    async fn test_report_serializes_camel_case_with_status_tags() {
        let provider = ScriptedProvider::new(vec![Ok(staffing_reply()), Ok(assessment_reply())]);

        let report = analyze_message(
            &provider,
            &OsintFlow::default(),
            ACME_MESSAGE,
            PromptOptions::default(),
        )
        .await
        .unwrap();

        let value = serde_json::to_value(&report).unwrap();
        assert!(value["analysisId"].is_string());
        assert!(value["generatedAt"].is_string());
        assert_eq!(value["normalized"]["status"], "success");
        assert_eq!(value["assessment"]["record"]["attractivenessScore"], 4);
    }
}
