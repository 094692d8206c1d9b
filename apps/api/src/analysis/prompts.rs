// All LLM prompt templates for the analysis flows.
// One parameterized template per flow; language and field format are substituted in.

use crate::analysis::language::PromptOptions;
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;

/// Role prompt for staffing-message extraction.
pub const STAFFING_SYSTEM: &str = "You are a precise staffing request analyst. \
    You read hiring and outstaffing messages and extract the key facts a recruiter needs.";

/// Staffing extraction prompt template.
/// Replace: {language_instruction}, {format_instruction}, {no_invention}, {message}
pub const STAFFING_PROMPT_TEMPLATE: &str = r#"Analyze this staffing request and extract the following information. {language_instruction}
1. Company name
2. Role name
3. Required tech stack
4. Project duration
5. Approximate team size (if specified or implied)
6. Minimum level of English
7. Relevant information from the request that was not included in other categories

{format_instruction}
{no_invention}

Source text:
{message}"#;

/// Role prompt for company research.
pub const OSINT_SYSTEM: &str = "You are an AI analyst who profiles hiring companies \
    for recruiters and candidates.";

/// Company research prompt template.
/// Replace: {language_instruction}, {format_instruction}, {company_name},
///          {normalized_data}, {target_role}
pub const OSINT_PROMPT_TEMPLATE: &str = r#"Given the company name and normalized data from the hiring message, perform an OSINT analysis to gather information about the company. {language_instruction}

Company name: {company_name}

Normalized data:
{normalized_data}

Generate the following information:

1.  What does this company do (website, sector, clients, products)?
2.  What type of company is it (startup / corporation / R&D center)?
3.  What are some interesting facts about the company (AI, investments, hiring)?
4.  How attractive is this company for a {target_role}, based on the project stack (integer score from 1 to 5)?
5.  What is the ideal profile of a {target_role} for working in this company, including soft skills, hard skills, tasks, and familiar projects/technologies?

{format_instruction}"#;

/// Renders the staffing extraction prompt for one message.
pub fn render_staffing_prompt(message: &str, options: PromptOptions) -> String {
    fill_template(
        STAFFING_PROMPT_TEMPLATE,
        &[
            ("language_instruction", options.language.instruction()),
            ("format_instruction", options.format.instruction()),
            ("no_invention", NO_INVENTION_INSTRUCTION),
            ("message", message),
        ],
    )
}

/// Renders the company research prompt.
pub fn render_osint_prompt(
    company_name: &str,
    normalized_data: &str,
    target_role: &str,
    options: PromptOptions,
) -> String {
    fill_template(
        OSINT_PROMPT_TEMPLATE,
        &[
            ("language_instruction", options.language.instruction()),
            ("format_instruction", options.format.instruction()),
            ("target_role", target_role),
            ("company_name", company_name),
            ("normalized_data", normalized_data),
        ],
    )
}

/// Replaces each `{key}` in `template` with its value in a single pass.
///
/// Inserted values are never rescanned, so caller text containing `{...}`
/// stays literal. Unknown placeholders are left as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = tail.find('}').and_then(|close| {
            let key = &tail[1..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
