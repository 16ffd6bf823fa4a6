//! Casual-question detection.
//!
//! Greetings and acknowledgements get a canned reply and skip retrieval,
//! generation and follow-ups entirely. Matching is exact on the trimmed,
//! lower-cased question so "hi, what do you sell?" is still substantive.

use comai_core::config::{default_casual_phrases, CasualPhrase};
use std::collections::HashMap;

/// Route taken for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Answer with the canned reply
    Casual(&'a str),
    /// Proceed to retrieval
    Substantive,
}

/// Exact-match lookup over the casual-phrase table.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    replies: HashMap<String, String>,
}

impl QueryClassifier {
    /// Build from a phrase table. Later duplicates win.
    pub fn new(table: &[CasualPhrase]) -> Self {
        let replies = table
            .iter()
            .map(|entry| (normalize(&entry.phrase), entry.reply.clone()))
            .collect();

        Self { replies }
    }

    pub fn classify(&self, question: &str) -> Classification<'_> {
        match self.replies.get(&normalize(question)) {
            Some(reply) => Classification::Casual(reply),
            None => Classification::Substantive,
        }
    }

    pub fn is_casual(&self, question: &str) -> bool {
        matches!(self.classify(question), Classification::Casual(_))
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(&default_casual_phrases())
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
