// Shared prompt constants and prompt-building utilities.
// Each flow defines its own templates in analysis::prompts.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that pins the answer to the forced tool call.
pub const STRUCTURED_OUTPUT_SYSTEM: &str = "\
    You MUST answer by calling the provided tool exactly once. \
    Put every answer into the tool input fields. \
    Do NOT reply with free text outside the tool call. \
    Do NOT include explanations or apologies.";

/// Instruction appended to extraction prompts so absent data stays absent.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only use information present in the source text. \
    If an optional item is not stated or implied, leave that field out instead of guessing.";

/// Joins a role-specific system prompt with the structured-output fragment.
pub fn structured_system(role_prompt: &str) -> String {
    format!("{role_prompt} {STRUCTURED_OUTPUT_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_system_keeps_role_prompt_first() {
        let system = structured_system("You are an analyst.");
        assert!(system.starts_with("You are an analyst."));
        assert!(system.contains("calling the provided tool"));
    }
}
