//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use comai_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Declared variables that are missing are rendered as empty strings so
/// optional sections (`{{#if memoryContext}}`) drop out cleanly.
///
/// # Example
/// ```no_run
/// use comai_prompt::{build_prompt, resolve_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = resolve_prompt(None, "rag.answer")?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What does Commedia do?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("{}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut empty_variables = Vec::new();
    for name in &definition.variables {
        let value = variables.entry(name.clone()).or_default();
        if value.trim().is_empty() {
            empty_variables.push(name.clone());
        }
    }

    let text = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        text,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            empty_variables,
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::resolve_prompt;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{question}}", &vars(&[("question", "Hi?")]));
        assert_eq!(result.unwrap(), "Question: Hi?");
    }

    #[test]
    fn test_render_does_not_escape() {
        let result = render_template("{{answer}}", &vars(&[("answer", "<b>\"R&D\"</b>")]));
        assert_eq!(result.unwrap(), "<b>\"R&D\"</b>");
    }

    #[test]
    fn test_render_template_syntax_error() {
        let result = render_template("{{#if}}", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_answer_prompt_with_history() {
        let def = resolve_prompt(None, "rag.answer").unwrap();
        let built = build_prompt(
            &def,
            vars(&[
                ("context", "Commedia builds websites."),
                ("memoryContext", "User asked about pricing earlier."),
                ("question", "What does Commedia do?"),
            ]),
        )
        .unwrap();

        assert!(built.text.contains("Context:\nCommedia builds websites."));
        assert!(built
            .text
            .contains("Conversation History:\nUser asked about pricing earlier."));
        assert!(built.text.contains("Question: What does Commedia do?"));
        assert!(built.metadata.empty_variables.is_empty());
        assert_eq!(built.metadata.source_prompt_id, "rag.answer");
    }

    #[test]
    fn test_answer_prompt_omits_empty_history() {
        let def = resolve_prompt(None, "rag.answer").unwrap();
        let built = build_prompt(
            &def,
            vars(&[("context", "ctx"), ("question", "What does Commedia do?")]),
        )
        .unwrap();

        assert!(!built.text.contains("Conversation History"));
        assert_eq!(built.metadata.empty_variables, vec!["memoryContext".to_string()]);
    }

    #[test]
    fn test_follow_up_prompt_embeds_question_and_answer() {
        let def = resolve_prompt(None, "rag.follow_up").unwrap();
        let built = build_prompt(
            &def,
            vars(&[("question", "How much?"), ("answer", "It depends.")]),
        )
        .unwrap();

        assert!(built.text.contains("Original Question: How much?"));
        assert!(built.text.contains("Answer: It depends."));
    }
}
