//! Error types for ComAI.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! language-model, retrieval, prompt and request-validation failures.

use thiserror::Error;

/// Unified error type for ComAI.
///
/// Fallible functions return `Result<T, AppError>`. Only `Input` and
/// `Uninitialized` are ever shown to an API caller; the pipeline absorbs
/// `Retrieval` and `Llm` failures into a degraded answer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language-model call failed or returned nothing usable
    #[error("LLM error: {0}")]
    Llm(String),

    /// Similarity search or embedding failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt loading or rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Caller supplied an invalid request (e.g. an empty question)
    #[error("{0}")]
    Input(String),

    /// The pipeline never came up; carries the startup failure
    #[error("RAG system not initialized: {0}")]
    Uninitialized(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Input(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
