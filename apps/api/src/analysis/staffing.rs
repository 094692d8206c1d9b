//! Staffing message extraction: free-text hiring request in, fixed-shape record out.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::error::AnalysisError;
use crate::analysis::flow::{as_object, optional_text, required_text, run_flow, StructuredFlow};
use crate::analysis::language::PromptOptions;
use crate::analysis::outcome::{Outcome, SERVICE_UNAVAILABLE};
use crate::analysis::prompts::{render_staffing_prompt, STAFFING_SYSTEM};
use crate::llm_client::prompts::structured_system;
use crate::llm_client::CompletionProvider;

/// Hiring attributes extracted from one staffing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStaffingRequest {
    /// The name of the company.
    pub company_name: String,
    /// The name of the role.
    pub role: String,
    /// The required tech stack.
    pub tech_stack: String,
    /// The duration of the project, if specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_duration: Option<String>,
    /// The approximate size of the team, if specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_size: Option<String>,
    /// The minimum required level of English, if specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_level: Option<String>,
    /// Relevant information from the request that was not included in other fields.
    pub relevant_info: String,
}

impl NormalizedStaffingRequest {
    /// Serialized form passed to the research flow as opaque context.
    pub fn to_context(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub struct StaffingFlow;

impl StructuredFlow for StaffingFlow {
    const NAME: &'static str = "normalize_staffing_message";
    const TOOL_NAME: &'static str = "record_staffing_request";
    const TOOL_DESCRIPTION: &'static str =
        "Record the normalized staffing request extracted from the source text.";

    type Input = str;
    type Output = NormalizedStaffingRequest;

    fn check_input(&self, message: &str) -> Result<(), AnalysisError> {
        if message.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "message cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn system_prompt(&self) -> String {
        structured_system(STAFFING_SYSTEM)
    }

    fn render_prompt(&self, message: &str, options: PromptOptions) -> String {
        render_staffing_prompt(message, options)
    }

    fn validate(&self, raw: Value) -> Result<NormalizedStaffingRequest, AnalysisError> {
        let raw = as_object(Self::NAME, raw)?;
        Ok(NormalizedStaffingRequest {
            company_name: required_text(Self::NAME, &raw, "companyName")?,
            role: required_text(Self::NAME, &raw, "role")?,
            tech_stack: required_text(Self::NAME, &raw, "techStack")?,
            project_duration: optional_text(Self::NAME, &raw, "projectDuration")?,
            team_size: optional_text(Self::NAME, &raw, "teamSize")?,
            english_level: optional_text(Self::NAME, &raw, "englishLevel")?,
            relevant_info: required_text(Self::NAME, &raw, "relevantInfo")?,
        })
    }

    fn sentinel(&self) -> NormalizedStaffingRequest {
        let marker = || SERVICE_UNAVAILABLE.to_string();
        NormalizedStaffingRequest {
            company_name: marker(),
            role: marker(),
            tech_stack: marker(),
            project_duration: Some(marker()),
            team_size: Some(marker()),
            english_level: Some(marker()),
            relevant_info: marker(),
        }
    }
}

/// Extracts a `NormalizedStaffingRequest` from a raw staffing message.
pub async fn normalize_staffing_message(
    provider: &dyn CompletionProvider,
    message: &str,
    options: PromptOptions,
) -> Result<Outcome<NormalizedStaffingRequest>, AnalysisError> {
    run_flow(provider, &StaffingFlow, message, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::language::ResponseLanguage;
    use crate::llm_client::scripted::ScriptedProvider;
    use crate::llm_client::LlmError;
    use serde_json::json;

    const ACME_MESSAGE: &str = "Acme Corp needs a Senior QA Automation Engineer, \
        React/TypeScript stack, 6-month project, team of 4, English B2+";

    fn acme_reply() -> Value {
        json!({
            "companyName": "Acme Corp",
            "role": "Senior QA Automation Engineer",
            "techStack": "React, TypeScript",
            "projectDuration": "6-month project",
            "teamSize": "4",
            "englishLevel": "B2+",
            "relevantInfo": "Senior level position"
        })
    }

    #[tokio::test]
    async fn test_acme_message_extracts_every_field() {
        let provider = ScriptedProvider::new(vec![Ok(acme_reply())]);

        let outcome = normalize_staffing_message(&provider, ACME_MESSAGE, PromptOptions::default())
            .await
            .unwrap();

        let record = outcome.success().expect("should not be degraded");
        assert_eq!(record.company_name, "Acme Corp");
        assert!(record.role.contains("QA Automation Engineer"));
        assert!(record.tech_stack.contains("React"));
        assert!(record.tech_stack.contains("TypeScript"));
        assert!(record.project_duration.as_deref().unwrap().contains("6-month"));
        assert!(record.team_size.as_deref().unwrap().contains('4'));
        assert!(record.english_level.as_deref().unwrap().contains("B2"));
    }

    #[tokio::test]
    async fn test_request_carries_message_schema_and_language() {
        let provider = ScriptedProvider::new(vec![Ok(acme_reply())]);
        let options = PromptOptions {
            language: ResponseLanguage::English,
            ..PromptOptions::default()
        };

        normalize_staffing_message(&provider, ACME_MESSAGE, options)
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.prompt.contains(ACME_MESSAGE));
        assert!(request.prompt.contains("Answer in English."));
        assert_eq!(request.tool.name, StaffingFlow::TOOL_NAME);

        let required = request.tool.input_schema["required"].as_array().unwrap();
        let required: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();
        for field in ["companyName", "role", "techStack", "relevantInfo"] {
            assert!(required.contains(&field), "{field} should be required");
        }
        assert!(!required.contains(&"teamSize"));
        assert!(request.tool.input_schema["properties"]["englishLevel"].is_object());
    }

    #[tokio::test]
    async fn test_optional_fields_may_be_absent() {
        let provider = ScriptedProvider::new(vec![Ok(json!({
            "companyName": "Globex",
            "role": "Backend Developer",
            "techStack": "Go",
            "relevantInfo": "Remote"
        }))]);

        let outcome = normalize_staffing_message(&provider, "Globex wants Go devs", PromptOptions::default())
            .await
            .unwrap();

        let record = outcome.into_record();
        assert_eq!(record.project_duration, None);
        assert_eq!(record.team_size, None);
        assert_eq!(record.english_level, None);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_schema_violation() {
        let mut reply = acme_reply();
        reply.as_object_mut().unwrap().remove("techStack");
        let provider = ScriptedProvider::new(vec![Ok(reply)]);

        let err = normalize_staffing_message(&provider, ACME_MESSAGE, PromptOptions::default())
            .await
            .unwrap_err();

        match err {
            AnalysisError::SchemaViolation { flow, detail } => {
                assert_eq!(flow, StaffingFlow::NAME);
                assert!(detail.contains("techStack"));
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_required_field_is_schema_violation() {
        let mut reply = acme_reply();
        reply["companyName"] = json!("   ");
        let provider = ScriptedProvider::new(vec![Ok(reply)]);

        let err = normalize_staffing_message(&provider, ACME_MESSAGE, PromptOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaViolation { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_provider_returns_sentinel() {
        let provider = ScriptedProvider::new(vec![Err(ScriptedProvider::unavailable())]);

        let outcome = normalize_staffing_message(&provider, ACME_MESSAGE, PromptOptions::default())
            .await
            .unwrap();

        assert!(outcome.is_degraded());
        let record = outcome.record();
        for value in [
            record.company_name.as_str(),
            record.role.as_str(),
            record.tech_stack.as_str(),
            record.project_duration.as_deref().unwrap(),
            record.team_size.as_deref().unwrap(),
            record.english_level.as_deref().unwrap(),
            record.relevant_info.as_str(),
        ] {
            assert_eq!(value, SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn test_non_transient_failure_propagates() {
        let provider = ScriptedProvider::new(vec![Err(LlmError::Api {
            status: 401,
            message: "invalid x-api-key".to_string(),
        })]);

        let err = normalize_staffing_message(&provider, ACME_MESSAGE, PromptOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Provider(LlmError::Api { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_message_never_reaches_provider() {
        let provider = ScriptedProvider::new(vec![Ok(acme_reply())]);

        let err = normalize_staffing_message(&provider, "  \n ", PromptOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_context_serialization_uses_wire_names() {
        let record = StaffingFlow.validate(acme_reply()).unwrap();
        let context = record.to_context();
        assert!(context.contains(r#""companyName":"Acme Corp""#));
        assert!(context.contains(r#""englishLevel":"B2+""#));
    }
}
