//! Passage retrieval.
//!
//! [`SimilaritySearch`] is the external vector-search capability;
//! [`Retriever`] is the thin adapter the pipeline calls. Neither retries nor
//! re-ranks: failures propagate and relevance order is kept as returned.

pub mod embedder;
pub mod qdrant;

pub use embedder::{EmbeddingProvider, HttpEmbedder};
pub use qdrant::QdrantSearch;

use crate::types::Passage;
use comai_core::AppResult;
use std::sync::Arc;

/// Vector similarity search over pre-ingested documents.
///
/// Implementations are shared read-only across concurrent requests.
#[async_trait::async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Passages most relevant to `query`, most relevant first.
    async fn search(&self, query: &str) -> AppResult<Vec<Passage>>;
}

/// Retriever adapter over a [`SimilaritySearch`] capability.
#[derive(Clone)]
pub struct Retriever {
    search: Arc<dyn SimilaritySearch>,
}

impl Retriever {
    pub fn new(search: Arc<dyn SimilaritySearch>) -> Self {
        Self { search }
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<Passage>> {
        let passages = self.search.search(query).await?;
        tracing::debug!("Retrieved {} passages", passages.len());
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comai_core::AppError;

    struct StaticSearch(Vec<Passage>);

    #[async_trait::async_trait]
    impl SimilaritySearch for StaticSearch {
        async fn search(&self, _query: &str) -> AppResult<Vec<Passage>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSearch;

    #[async_trait::async_trait]
    impl SimilaritySearch for BrokenSearch {
        async fn search(&self, _query: &str) -> AppResult<Vec<Passage>> {
            Err(AppError::Retrieval("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_retrieve_keeps_order() {
        let passages = vec![
            Passage::new("most relevant", "b.md"),
            Passage::new("less relevant", "a.md"),
        ];
        let retriever = Retriever::new(Arc::new(StaticSearch(passages.clone())));

        assert_eq!(retriever.retrieve("q").await.unwrap(), passages);
    }

    #[tokio::test]
    async fn test_retrieve_propagates_failure() {
        let retriever = Retriever::new(Arc::new(BrokenSearch));

        assert!(matches!(
            retriever.retrieve("q").await,
            Err(AppError::Retrieval(_))
        ));
    }
}
