//! Query orchestration for ComAI.
//!
//! Turns a question (plus optional conversation memory) into a grounded
//! answer, a deduplicated source list and follow-up suggestions:
//!
//! ```text
//! question -> classifier -> [retriever -> generator -> dedupe -> follow-ups] -> RagResult
//! ```
//!
//! The vector store and the language model are external capabilities
//! ([`SimilaritySearch`], [`comai_llm::LlmClient`]) bundled at startup by
//! [`bootstrap`]. Per-request retrieval and generation failures degrade to a
//! fixed answer instead of surfacing as errors.

pub mod classifier;
pub mod followup;
pub mod generator;
pub mod pipeline;
pub mod retrieval;
pub mod sources;
pub mod startup;
pub mod stream;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use classifier::{Classification, QueryClassifier};
pub use followup::FollowUpGenerator;
pub use generator::AnswerGenerator;
pub use pipeline::{Capabilities, Pipeline, PipelineOptions, PipelineSettings, Stage};
pub use retrieval::{Retriever, SimilaritySearch};
pub use sources::dedupe_sources;
pub use startup::{bootstrap, PipelineHandle, NOT_INITIALIZED};
pub use stream::{replay, stream_query};
pub use types::{MemoryContext, Passage, Question, RagResult, StreamEvent, DEGRADED_ANSWER};
