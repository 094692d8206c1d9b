// Staffing message analysis: structured extraction and company research.
// Both flows share one shape (flow.rs); all LLM calls go through llm_client.

pub mod error;
pub mod flow;
pub mod handlers;
pub mod language;
pub mod osint;
pub mod outcome;
pub mod pipeline;
pub mod prompts;
pub mod staffing;
