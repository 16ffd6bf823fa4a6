//! LLM integration crate for ComAI.
//!
//! This crate provides the text-generation capability consumed by the RAG
//! pipeline: a provider-agnostic [`LlmClient`] trait and an implementation
//! for any endpoint that speaks the OpenAI chat completions API
//! (Together, OpenAI, vLLM, Ollama's `/v1` surface, ...).
//!
//! # Example
//! ```no_run
//! use comai_llm::{LlmClient, LlmRequest, providers::OpenAiCompatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::new("https://api.together.xyz/v1", Some("key".into()));
//! let request = LlmRequest::new("Hello, world!", "mistralai/Mixtral-8x7B-Instruct-v0.1");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OpenAiCompatClient;
pub use types::ProviderType;
