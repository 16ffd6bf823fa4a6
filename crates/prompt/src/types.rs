//! Prompt definition and rendering result types.

use serde::{Deserialize, Serialize};

/// One prompt file, e.g. `prompts/rag.answer.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    /// Identifier; must match the file stem
    pub id: String,

    pub title: String,

    /// Schema version, `major.minor`
    pub api_version: String,

    /// Template variables. Missing ones render as empty strings.
    #[serde(default)]
    pub variables: Vec<String>,

    /// Handlebars template
    pub template: String,

    #[serde(default)]
    pub output: PromptOutputSpec,
}

/// What the model is asked to produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Shape of the completion the template asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A rendered prompt.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub text: String,
    pub metadata: BuiltPromptMetadata,
}

/// Where a rendered prompt came from.
#[derive(Debug, Clone)]
pub struct BuiltPromptMetadata {
    pub source_prompt_id: String,

    /// Declared variables that were absent or blank at render time
    pub empty_variables: Vec<String>,
}
