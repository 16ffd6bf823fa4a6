//! OpenAI-compatible chat completions provider.
//!
//! Works against any endpoint implementing `POST {base}/chat/completions`,
//! which covers Together, OpenAI, vLLM and Ollama's `/v1` surface.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use comai_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI-compatible LLM client.
pub struct OpenAiCompatClient {
    /// Base URL, e.g. `https://api.together.xyz/v1`
    base_url: String,

    /// Bearer token, if the endpoint needs one
    api_key: Option<String>,

    provider: String,

    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a client with the default request timeout (60s).
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(base_url, api_key, Duration::from_secs(60))
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            provider: "openai-compatible".to_string(),
            client,
        }
    }

    /// Report a specific provider name in logs.
    pub fn with_provider_name(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert LlmRequest to the chat completions format.
    fn to_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(request.prompt.clone()),
            }],
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    /// Convert a chat completions response to LlmResponse.
    fn convert_response(
        &self,
        request: &LlmRequest,
        response: ChatResponse,
    ) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Llm("Completion contained no choices".to_string()))?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model.unwrap_or_else(|| request.model.clone()),
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            provider = %self.provider,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending chat completion request"
        );

        let body = self.to_chat_request(request);
        let mut http_request = self.client.post(self.completions_url()).json(&body);

        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await.map_err(|e| {
            AppError::Llm(format!(
                "Failed to send request to {}: {}",
                self.provider, e
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                self.provider, status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse completion response: {}", e)))?;

        let response = self.convert_response(request, chat_response)?;

        tracing::debug!(
            completion_tokens = response.usage.completion_tokens,
            "Received chat completion"
        );

        Ok(response)
    }
}
