use async_trait::async_trait;

use crate::domain::Embedding;

/// Produces dense vectors for chunk text and chat queries.
///
/// `embed_batch` exists so indexing a whole document costs one round
/// trip per batch rather than one per chunk.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError>;
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    ApiRequestFailed(String),
    #[error("embedding service rate limited")]
    RateLimited,
    #[error("malformed embedding response: {0}")]
    InvalidResponse(String),
}
