use std::sync::Arc;

use crate::analysis::language::PromptOptions;
use crate::analysis::osint::OsintFlow;
use crate::config::Config;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable completion backend. Production: `LlmClient`.
    pub provider: Arc<dyn CompletionProvider>,
    /// Configured research flow (target role, score policy).
    pub osint: OsintFlow,
    /// Default language/format; requests may override per call.
    pub prompt_options: PromptOptions,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        Self {
            provider,
            osint: OsintFlow {
                target_role: config.target_role.clone(),
                score_policy: config.score_policy,
            },
            prompt_options: PromptOptions {
                language: config.response_language,
                format: config.field_format,
            },
        }
    }
}
