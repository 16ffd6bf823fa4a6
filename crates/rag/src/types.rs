//! Request, result and stream types.

use comai_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer returned when retrieval or generation fails.
pub const DEGRADED_ANSWER: &str = "Oops! Something went wrong. Try again later.";

/// Source identifier for passages that carry none.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// A user question, guaranteed non-empty after trimming.
///
/// The original text is kept as-is; classification works on the trimmed,
/// lower-cased form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Validate raw user text.
    pub fn parse(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AppError::Input("Question cannot be empty".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trimmed, lower-cased text used for phrase and keyword matching.
    pub fn normalized(&self) -> String {
        self.0.trim().to_lowercase()
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text summary of earlier turns, injected verbatim into the answer
/// prompt. Absent memory is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryContext(String);

impl MemoryContext {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Option<String>> for MemoryContext {
    fn from(value: Option<String>) -> Self {
        Self(value.unwrap_or_default())
    }
}

impl From<String> for MemoryContext {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MemoryContext {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One retrieved chunk of text and the document it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,

    /// Document path or URL, when the index recorded one
    pub source: Option<String>,
}

impl Passage {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: Some(source.into()),
        }
    }

    pub fn unsourced(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }
}

/// Outcome of one pipeline invocation.
///
/// `follow_ups` holds either zero or three questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RagResult {
    question: String,
    answer: String,
    sources: Vec<String>,
    follow_ups: Vec<String>,
}

impl RagResult {
    pub(crate) fn new(
        question: &Question,
        answer: String,
        sources: Vec<String>,
        follow_ups: Vec<String>,
    ) -> Self {
        Self {
            question: question.as_str().to_string(),
            answer,
            sources,
            follow_ups,
        }
    }

    /// Canned reply for a casual question.
    pub(crate) fn casual(question: &Question, reply: &str) -> Self {
        Self::new(question, reply.to_string(), Vec::new(), Vec::new())
    }

    /// Fixed answer used when retrieval or generation failed.
    pub(crate) fn degraded(question: &Question) -> Self {
        Self::new(question, DEGRADED_ANSWER.to_string(), Vec::new(), Vec::new())
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }

    /// Split into `(answer, sources, follow_ups)`.
    pub fn into_parts(self) -> (String, Vec<String>, Vec<String>) {
        (self.answer, self.sources, self.follow_ups)
    }
}

/// One line of a streamed response.
///
/// Serialized as `{"type": "...", "content": ...}`; `done` has no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum StreamEvent {
    Token(String),
    Sources(Vec<String>),
    FollowUps(Vec<String>),
    Done,
    Error(String),
}

impl StreamEvent {
    /// Encode as one newline-terminated JSON line.
    pub fn to_ndjson(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(e) => {
                tracing::error!("Failed to encode stream event: {}", e);
                "{\"type\":\"error\",\"content\":\"Something went wrong. Please try again.\"}\n"
                    .to_string()
            }
        }
    }
}
