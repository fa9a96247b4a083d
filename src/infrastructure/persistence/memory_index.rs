use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::application::ports::{ScoredChunk, VectorIndex, VectorIndexError};
use crate::domain::{Chunk, ChunkId, DocumentId, Embedding};

/// Process-local similarity index. Chunks are rebuilt from the stored PDF
/// on re-ingest, so index contents do not need to outlive the process.
pub struct InMemoryVectorIndex {
    entries: RwLock<HashMap<ChunkId, (Chunk, Embedding)>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    #[instrument(skip(self, chunks, embeddings), fields(count = chunks.len()))]
    async fn upsert(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorIndexError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorIndexError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let mut entries = self.entries.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            entries.insert(chunk.id, (chunk.clone(), embedding.clone()));
        }

        Ok(())
    }

    #[instrument(skip(self, query), fields(document_id = %document_id, top_k))]
    async fn search(
        &self,
        document_id: &DocumentId,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, VectorIndexError> {
        let entries = self.entries.read().await;

        let mut scored: Vec<ScoredChunk> = entries
            .values()
            .filter(|(chunk, _)| &chunk.document_id == document_id)
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn fetch(&self, chunk_ids: &[ChunkId]) -> Result<Vec<Chunk>, VectorIndexError> {
        let entries = self.entries.read().await;

        Ok(chunk_ids
            .iter()
            .filter_map(|id| entries.get(id).map(|(chunk, _)| chunk.clone()))
            .collect())
    }
}
