//! Qdrant-backed similarity search over the REST API.
//!
//! Documents are expected in the layout written by common ingestion
//! tooling: passage text under `page_content`, metadata (including
//! `source`) under `metadata`. Both keys are configurable.

use super::embedder::EmbeddingProvider;
use super::SimilaritySearch;
use crate::types::Passage;
use comai_core::config::RetrieverConfig;
use comai_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

/// Similarity search against one Qdrant collection.
#[derive(Debug)]
pub struct QdrantSearch {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    content_key: String,
    source_key: String,
    top_k: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QdrantSearch {
    pub fn new(config: &RetrieverConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
            content_key: config.content_payload_key.clone(),
            source_key: config.source_payload_key.clone(),
            top_k: config.top_k,
            embedder,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => request.header("api-key", key),
            None => request,
        }
    }

    /// Verify the collection exists and the server answers.
    pub async fn check_collection(&self) -> AppResult<()> {
        tracing::info!("Connecting to Qdrant at {}", self.base_url);

        let response = self
            .with_auth(self.client.get(self.collection_url()))
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Qdrant unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Retrieval(format!(
                "Qdrant collection '{}' unavailable ({})",
                self.collection,
                response.status()
            )));
        }

        tracing::info!("Qdrant collection '{}' is available", self.collection);
        Ok(())
    }

    /// Map scored points to passages, keeping Qdrant's order.
    fn to_passages(&self, points: Vec<ScoredPoint>) -> Vec<Passage> {
        points
            .into_iter()
            .map(|point| {
                let payload = point.payload.unwrap_or(Value::Null);

                let text = match lookup(&payload, &self.content_key) {
                    Some(Value::String(s)) => s.clone(),
                    _ => {
                        tracing::warn!(
                            score = point.score,
                            "Point has no '{}' payload text",
                            self.content_key
                        );
                        String::new()
                    }
                };

                let source = match lookup(&payload, &self.source_key) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };

                Passage { text, source }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl SimilaritySearch for QdrantSearch {
    async fn search(&self, query: &str) -> AppResult<Vec<Passage>> {
        let vector = self.embedder.embed(query).await?;

        let body = SearchRequest {
            vector: &vector,
            limit: self.top_k,
            with_payload: true,
        };

        let response = self
            .with_auth(
                self.client
                    .post(format!("{}/points/search", self.collection_url()))
                    .json(&body),
            )
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Qdrant search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Qdrant search error ({}): {}",
                status, error_text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse Qdrant response: {}", e)))?;

        Ok(self.to_passages(parsed.result))
    }
}

/// Follow a dotted path (`metadata.source`) into a JSON payload.
fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(payload, |value, key| value.as_object()?.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct ZeroEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ZeroEmbedder {
        fn model_name(&self) -> &str {
            "zero"
        }

        async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
            Ok(vec![0.0; 4])
        }
    }

    fn search() -> QdrantSearch {
        QdrantSearch::new(&RetrieverConfig::default(), Arc::new(ZeroEmbedder))
    }

    #[test]
    fn test_lookup_dotted_path() {
        let payload = json!({"metadata": {"source": "docs/about.md"}, "page_content": "x"});

        assert_eq!(lookup(&payload, "page_content"), Some(&json!("x")));
        assert_eq!(
            lookup(&payload, "metadata.source"),
            Some(&json!("docs/about.md"))
        );
        assert_eq!(lookup(&payload, "metadata.title"), None);
        assert_eq!(lookup(&payload, "page_content.inner"), None);
    }

    #[test]
    fn test_points_to_passages_keeps_order() {
        let response: SearchResponse = serde_json::from_value(json!({
            "result": [
                {"id": 7, "score": 0.91, "payload": {"page_content": "Services...", "metadata": {"source": "docs/services.md"}}},
                {"id": 3, "score": 0.80, "payload": {"page_content": "About...", "metadata": {}}},
                {"id": 9, "score": 0.75, "payload": {"page_content": "Page 2", "metadata": {"source": 2}}}
            ],
            "status": "ok",
            "time": 0.001
        }))
        .unwrap();

        let passages = search().to_passages(response.result);

        assert_eq!(
            passages,
            vec![
                Passage::new("Services...", "docs/services.md"),
                Passage::unsourced("About..."),
                Passage::new("Page 2", "2"),
            ]
        );
    }

    #[test]
    fn test_missing_payload_yields_empty_text() {
        let passages = search().to_passages(vec![ScoredPoint {
            score: 0.5,
            payload: None,
        }]);

        assert_eq!(passages, vec![Passage::unsourced("")]);
    }

    #[test]
    fn test_search_request_shape() {
        let vector = [0.1_f32, 0.2];
        let body = SearchRequest {
            vector: &vector,
            limit: 4,
            with_payload: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["limit"], 4);
        assert_eq!(json["with_payload"], true);
        assert_eq!(json["vector"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_qdrant() {
        let config = RetrieverConfig {
            qdrant_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..Default::default()
        };
        let search = QdrantSearch::new(&config, Arc::new(ZeroEmbedder));

        assert!(matches!(
            search.check_collection().await,
            Err(AppError::Retrieval(_))
        ));
        assert!(matches!(
            search.search("anything").await,
            Err(AppError::Retrieval(_))
        ));
    }
}
