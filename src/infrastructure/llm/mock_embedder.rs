use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;

const DIMENSIONS: usize = 8;

/// Deterministic test embedder: vectors are derived from a content hash,
/// so identical text always embeds identically and no network is involved.
#[derive(Default)]
pub struct MockEmbedder;

impl MockEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn vector_for(text: &str) -> Embedding {
        let digest = Sha256::digest(text.as_bytes());
        let values = digest
            .iter()
            .take(DIMENSIONS)
            .map(|b| (*b as f32 / 255.0) * 2.0 - 1.0)
            .collect();
        Embedding::new(values)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}
