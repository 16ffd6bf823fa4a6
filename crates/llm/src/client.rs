//! LLM client abstraction and request/response types.
//!
//! The pipeline only ever needs one operation from a language model,
//! `complete(prompt) -> text`, so the trait stays that small.

use comai_core::AppResult;
use serde::{Deserialize, Serialize};

/// One completion call: a single user prompt plus sampling knobs.
///
/// Unset knobs are left to the provider's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,

    /// e.g. "mistralai/Mixtral-8x7B-Instruct-v0.1"
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Generated text and the model that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,

    /// Zeroed when the provider does not report usage
    #[serde(default)]
    pub usage: LlmUsage,
}

/// Token accounting as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Text-generation capability.
///
/// One instance is shared by every in-flight request, so implementations
/// must be `Send + Sync` and hold no per-request state.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name for logs ("together", "ollama", ...)
    fn provider_name(&self) -> &str;

    /// Complete `request.prompt` and return the generated text.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
