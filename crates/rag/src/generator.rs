//! Grounded answer generation.

use crate::types::{MemoryContext, Passage, Question};
use comai_core::config::Sampling;
use comai_core::{AppError, AppResult};
use comai_llm::{LlmClient, LlmRequest};
use comai_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Produces one answer per question from retrieved passages.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    sampling: Sampling,
    prompt: PromptDefinition,
}

impl AnswerGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        sampling: Sampling,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            sampling,
            prompt,
        }
    }

    /// Generate an answer grounded in `passages`.
    ///
    /// The model output is returned untouched; only an empty completion is
    /// treated as a failure.
    pub async fn generate(
        &self,
        question: &Question,
        passages: &[Passage],
        memory: &MemoryContext,
    ) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), build_context(passages));
        variables.insert("memoryContext".to_string(), memory.as_str().to_string());
        variables.insert("question".to_string(), question.as_str().to_string());

        let built = build_prompt(&self.prompt, variables)?;

        tracing::debug!(
            prompt = %built.metadata.source_prompt_id,
            empty_variables = ?built.metadata.empty_variables,
            passages = passages.len(),
            "Generating answer"
        );

        let request = sampled_request(built.text, &self.model, &self.sampling);
        let response = self.client.complete(&request).await?;

        if response.content.trim().is_empty() {
            return Err(AppError::Llm("Model returned an empty answer".to_string()));
        }

        Ok(response.content)
    }
}

/// Concatenate passage texts in retrieval order.
fn build_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build a completion request with the given sampling parameters.
pub(crate) fn sampled_request(prompt: String, model: &str, sampling: &Sampling) -> LlmRequest {
    let mut request = LlmRequest::new(prompt, model)
        .with_temperature(sampling.temperature)
        .with_top_p(sampling.top_p);

    if let Some(max_tokens) = sampling.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    request
}
