//! Query embedding.
//!
//! Embeds the question through an OpenAI-compatible `/embeddings` endpoint
//! (text-embeddings-inference, vLLM, OpenAI, Ollama `/v1`).

use comai_core::config::EmbeddingSettings;
use comai_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate the embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// HTTP embedding provider.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.endpoint)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let mut request = self.client.post(self.embeddings_url()).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Retrieval(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Retrieval("No embedding returned".to_string()))?;

        tracing::debug!(dimensions = embedding.len(), "Embedded query");

        Ok(embedding)
    }
}
