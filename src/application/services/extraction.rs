use std::sync::Arc;

use crate::application::ports::{CacheStore, PdfParser, PdfParserError, RepositoryError};
use crate::domain::{DocumentId, TextBlock};

/// Wraps the external PDF parser with a content-hash-keyed cache: a second
/// ingestion of byte-identical content never touches the parser again.
pub struct ExtractionService {
    parser: Arc<dyn PdfParser>,
    cache: Arc<dyn CacheStore>,
}

impl ExtractionService {
    pub fn new(parser: Arc<dyn PdfParser>, cache: Arc<dyn CacheStore>) -> Self {
        Self { parser, cache }
    }

    fn cache_key(document_id: &DocumentId) -> String {
        format!("blocks:{}", document_id)
    }

    #[tracing::instrument(skip(self, data), fields(document_id = %document_id, bytes = data.len()))]
    pub async fn extract(
        &self,
        document_id: &DocumentId,
        data: &[u8],
    ) -> Result<Vec<TextBlock>, ExtractionError> {
        let key = Self::cache_key(document_id);

        if let Some(cached) = self.cache.get(&key).await? {
            match serde_json::from_str::<Vec<TextBlock>>(&cached) {
                Ok(blocks) => {
                    tracing::info!(blocks = blocks.len(), "Extraction cache hit");
                    return Ok(blocks);
                }
                Err(e) => {
                    // Stale or corrupt entry; fall through to re-extraction.
                    tracing::warn!(error = %e, "Discarding unreadable cached extraction");
                }
            }
        }

        let blocks = self.parser.extract_blocks(data).await?;
        tracing::info!(blocks = blocks.len(), "PDF extraction complete");

        let serialized = serde_json::to_string(&blocks)
            .map_err(|e| ExtractionError::CacheSerialization(e.to_string()))?;
        self.cache.put(&key, &serialized).await?;

        Ok(blocks)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("parse: {0}")]
    Parse(#[from] PdfParserError),
    #[error("cache: {0}")]
    Cache(#[from] RepositoryError),
    #[error("cache serialization: {0}")]
    CacheSerialization(String),
}
