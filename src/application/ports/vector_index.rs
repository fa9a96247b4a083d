use async_trait::async_trait;

use crate::domain::{Chunk, ChunkId, DocumentId, Embedding};

/// Similarity store for chunk retrieval. Used only at chat time, never
/// during concern detection. Search is always scoped to one document so
/// retrieval can never leak context across documents.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorIndexError>;

    async fn search(
        &self,
        document_id: &DocumentId,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, VectorIndexError>;

    /// Fetches chunks by id; ids absent from the index are silently omitted.
    async fn fetch(&self, chunk_ids: &[ChunkId]) -> Result<Vec<Chunk>, VectorIndexError>;
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum VectorIndexError {
    #[error("index write failed: {0}")]
    UpsertFailed(String),
    #[error("search failed: {0}")]
    SearchFailed(String),
    #[error("chunk/embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    CountMismatch { chunks: usize, embeddings: usize },
}
