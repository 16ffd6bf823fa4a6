//! Follow-up question suggestions.
//!
//! A secondary completion is asked for a JSON array of three questions.
//! Anything short of that, including a failed call, falls back to a fixed
//! keyword-driven triple. The generator never returns an error.

use crate::classifier::QueryClassifier;
use crate::generator::sampled_request;
use crate::types::Question;
use comai_core::config::Sampling;
use comai_core::AppResult;
use comai_llm::LlmClient;
use comai_prompt::{build_prompt, PromptDefinition};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of follow-ups offered on a substantive answer.
pub const FOLLOW_UP_COUNT: usize = 3;

struct FallbackRule {
    keywords: &'static [&'static str],
    questions: [&'static str; FOLLOW_UP_COUNT],
}

/// Checked in order; the first rule with a matching keyword wins.
const FALLBACK_RULES: [FallbackRule; 3] = [
    FallbackRule {
        keywords: &["service", "what does"],
        questions: [
            "How can I contact Commedia Solutions?",
            "What industries does Commedia serve?",
            "Can you tell me more about Commedia's experience?",
        ],
    },
    FallbackRule {
        keywords: &["contact", "reach"],
        questions: [
            "What services does Commedia provide?",
            "What are Commedia's business hours?",
            "Does Commedia offer consultations?",
        ],
    },
    FallbackRule {
        keywords: &["price", "cost"],
        questions: [
            "What services are included in Commedia's packages?",
            "How can I get a quote from Commedia?",
            "Does Commedia offer custom solutions?",
        ],
    },
];

const DEFAULT_FOLLOW_UPS: [&str; FOLLOW_UP_COUNT] = [
    "What services does Commedia Solutions provide?",
    "How can I contact Commedia Solutions?",
    "Can you tell me more about Commedia's expertise?",
];

/// Suggests three follow-up questions for an answered question.
#[derive(Clone)]
pub struct FollowUpGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    sampling: Sampling,
    prompt: PromptDefinition,
    classifier: Arc<QueryClassifier>,
}

impl FollowUpGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        sampling: Sampling,
        prompt: PromptDefinition,
        classifier: Arc<QueryClassifier>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            sampling,
            prompt,
            classifier,
        }
    }

    /// Three suggestions, or none for a casual question.
    pub async fn suggest(&self, question: &Question, answer: &str) -> Vec<String> {
        if self.classifier.is_casual(question.as_str()) {
            return Vec::new();
        }

        match self.request_follow_ups(question, answer).await {
            Ok(raw) => match parse_follow_ups(&raw) {
                Some(follow_ups) => return follow_ups,
                None => tracing::warn!("Follow-up output was not a JSON array of 3+ items"),
            },
            Err(e) => tracing::warn!("Follow-up generation failed: {}", e),
        }

        fallback_follow_ups(question)
    }

    async fn request_follow_ups(&self, question: &Question, answer: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.as_str().to_string());
        variables.insert("answer".to_string(), answer.to_string());

        let built = build_prompt(&self.prompt, variables)?;
        let request = sampled_request(built.text, &self.model, &self.sampling);

        Ok(self.client.complete(&request).await?.content)
    }
}

/// Extract the first `[...]` span from model output and accept it if it is
/// a JSON array of at least three items. Non-string items are stringified.
pub fn parse_follow_ups(raw: &str) -> Option<Vec<String>> {
    let start = raw.find('[')?;
    let end = start + raw[start..].find(']')?;

    let items = match serde_json::from_str::<Value>(&raw[start..=end]).ok()? {
        Value::Array(items) if items.len() >= FOLLOW_UP_COUNT => items,
        _ => return None,
    };

    Some(
        items
            .into_iter()
            .take(FOLLOW_UP_COUNT)
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Deterministic follow-ups chosen by keywords in the question.
pub fn fallback_follow_ups(question: &Question) -> Vec<String> {
    let text = question.normalized();

    let questions = FALLBACK_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(k)))
        .map(|rule| rule.questions)
        .unwrap_or(DEFAULT_FOLLOW_UPS);

    questions.iter().map(|q| q.to_string()).collect()
}
