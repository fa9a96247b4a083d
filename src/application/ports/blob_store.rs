use async_trait::async_trait;

use crate::domain::DocumentId;

/// Storage for uploaded originals, keyed by content-derived document id so
/// a re-upload of identical bytes overwrites with the same content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, id: &DocumentId, data: &[u8]) -> Result<(), BlobStoreError>;

    async fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
}
