//! Prompt localization: response language and field formatting are the only
//! knobs that vary between prompt variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Human language the model must answer in.
///
/// Deserializes through `FromStr`, so request bodies accept the same spellings
/// as `RESPONSE_LANGUAGE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ResponseLanguage {
    English,
    #[default]
    Russian,
}

impl ResponseLanguage {
    pub fn instruction(self) -> &'static str {
        match self {
            ResponseLanguage::English => "Answer in English.",
            ResponseLanguage::Russian => "Answer in Russian.",
        }
    }
}

impl FromStr for ResponseLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(ResponseLanguage::English),
            "ru" | "russian" => Ok(ResponseLanguage::Russian),
            other => Err(format!(
                "unknown response language '{other}' (expected en or ru)"
            )),
        }
    }
}

impl TryFrom<String> for ResponseLanguage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ResponseLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseLanguage::English => write!(f, "en"),
            ResponseLanguage::Russian => write!(f, "ru"),
        }
    }
}

/// Formatting allowed inside each extracted text field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FieldFormat {
    Plain,
    #[default]
    Markdown,
}

impl FieldFormat {
    pub fn instruction(self) -> &'static str {
        match self {
            FieldFormat::Plain => "Write every field as plain text without Markdown.",
            FieldFormat::Markdown => {
                "Format longer field values in Markdown with titles and lists where it helps readability."
            }
        }
    }
}

impl FromStr for FieldFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "text" => Ok(FieldFormat::Plain),
            "markdown" | "md" => Ok(FieldFormat::Markdown),
            other => Err(format!(
                "unknown field format '{other}' (expected plain or markdown)"
            )),
        }
    }
}

impl TryFrom<String> for FieldFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Per-call prompt configuration shared by both flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptOptions {
    pub language: ResponseLanguage,
    pub format: FieldFormat,
}

impl PromptOptions {
    /// Applies request-level overrides on top of the configured defaults.
    pub fn with_overrides(
        self,
        language: Option<ResponseLanguage>,
        format: Option<FieldFormat>,
    ) -> Self {
        Self {
            language: language.unwrap_or(self.language),
            format: format.unwrap_or(self.format),
        }
    }
}
