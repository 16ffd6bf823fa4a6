//! Prompt system for ComAI.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in answer and follow-up prompts, overridable from a directory
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{ANSWER_PROMPT_ID, FOLLOW_UP_PROMPT_ID};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, OutputFormat, PromptDefinition, PromptOutputSpec};
