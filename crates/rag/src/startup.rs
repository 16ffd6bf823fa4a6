//! Startup: build the capability bundle once, or record why it could not be
//! built.

use crate::pipeline::{Capabilities, Pipeline, PipelineSettings};
use crate::retrieval::{EmbeddingProvider, HttpEmbedder, QdrantSearch};
use comai_core::{AppConfig, AppError, AppResult};
use comai_llm::create_client;
use std::sync::Arc;
use std::time::Duration;

/// Message reported to callers while the pipeline is unavailable.
pub const NOT_INITIALIZED: &str = "RAG system not initialized";

/// The pipeline, or the reason startup failed.
///
/// Checked on every request; an uninitialized handle never attempts
/// partial work.
#[derive(Clone)]
pub enum PipelineHandle {
    Ready(Arc<Pipeline>),
    Uninitialized(Arc<str>),
}

impl PipelineHandle {
    pub fn ready(pipeline: Pipeline) -> Self {
        Self::Ready(Arc::new(pipeline))
    }

    pub fn uninitialized(reason: impl Into<String>) -> Self {
        Self::Uninitialized(Arc::from(reason.into()))
    }

    pub fn pipeline(&self) -> AppResult<&Arc<Pipeline>> {
        match self {
            Self::Ready(pipeline) => Ok(pipeline),
            Self::Uninitialized(reason) => Err(AppError::Uninitialized(reason.to_string())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Connect to the vector store, create the LLM client and assemble the
/// pipeline. Failures are logged and turned into an uninitialized handle.
pub async fn bootstrap(config: &AppConfig) -> PipelineHandle {
    match build(config).await {
        Ok(pipeline) => {
            tracing::info!(
                "RAG pipeline ready (provider: {}, model: {})",
                config.llm.provider,
                config.llm.model
            );
            PipelineHandle::ready(pipeline)
        }
        Err(e) => {
            tracing::error!("Fatal RAG startup error: {}", e);
            PipelineHandle::uninitialized(e.to_string())
        }
    }
}

async fn build(config: &AppConfig) -> AppResult<Pipeline> {
    config.validate()?;

    let retriever = &config.retriever;
    let embedder = HttpEmbedder::new(
        &retriever.embedding,
        Duration::from_secs(retriever.timeout_secs),
    );

    tracing::info!("Embedding queries with {}", embedder.model_name());
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);

    let search = QdrantSearch::new(retriever, embedder.clone());
    search.check_collection().await?;

    let dimensions = embedder.embed("startup check").await?.len();
    tracing::info!("Embedding endpoint answered ({} dimensions)", dimensions);

    let llm = create_client(
        &config.llm.provider,
        config.llm.endpoint.as_deref(),
        config.llm.api_key.as_deref(),
        Duration::from_secs(config.llm.timeout_secs),
    )
    .map_err(AppError::Config)?;
    tracing::debug!("LLM client ready ({})", llm.provider_name());

    let settings = PipelineSettings::from_config(config)?;

    Ok(Pipeline::new(
        Capabilities {
            search: Arc::new(search),
            llm,
        },
        settings,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers every request with 200 and a collection-info body.
    async fn spawn_fake_qdrant() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let body = r#"{"result":{"status":"green"},"status":"ok"}"#;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                         content-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_uninitialized_handle_reports_reason() {
        let handle = PipelineHandle::uninitialized("Qdrant unreachable");

        assert!(!handle.is_ready());
        match handle.pipeline() {
            Err(AppError::Uninitialized(reason)) => assert_eq!(reason, "Qdrant unreachable"),
            _ => panic!("expected uninitialized error"),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_invalid_config_is_uninitialized() {
        let mut config = AppConfig::default();
        config.llm.provider = "nope".to_string();

        let handle = bootstrap(&config).await;
        assert!(!handle.is_ready());
    }

    #[tokio::test]
    async fn test_bootstrap_unreachable_qdrant_is_uninitialized() {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        config.retriever.qdrant_url = "http://127.0.0.1:9".to_string();
        config.retriever.timeout_secs = 1;

        let handle = bootstrap(&config).await;

        match handle.pipeline() {
            Err(AppError::Uninitialized(reason)) => assert!(reason.contains("Qdrant")),
            _ => panic!("expected uninitialized handle"),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_unreachable_embedder_is_uninitialized() {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        config.retriever.qdrant_url = spawn_fake_qdrant().await;
        config.retriever.embedding.endpoint = "http://127.0.0.1:9".to_string();
        config.retriever.timeout_secs = 1;

        let handle = bootstrap(&config).await;

        assert!(!handle.is_ready());
        match handle.pipeline() {
            Err(AppError::Uninitialized(reason)) => assert!(reason.contains("Embedding")),
            _ => panic!("expected uninitialized handle"),
        }
    }
}
