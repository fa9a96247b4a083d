use std::path::PathBuf;
use std::sync::Arc;

use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use tracing::instrument;

use crate::application::ports::{BlobStore, BlobStoreError};
use crate::domain::DocumentId;

pub struct LocalBlobStore {
    inner: Arc<LocalFileSystem>,
}

impl LocalBlobStore {
    pub fn new(base_path: PathBuf) -> Result<Self, BlobStoreError> {
        std::fs::create_dir_all(&base_path)
            .map_err(|e| BlobStoreError::WriteFailed(e.to_string()))?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| BlobStoreError::WriteFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }

    fn store_path(id: &DocumentId) -> StorePath {
        StorePath::from(format!("{}.pdf", id.as_str()))
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, data), fields(document_id = %id, bytes = data.len()))]
    async fn put(&self, id: &DocumentId, data: &[u8]) -> Result<(), BlobStoreError> {
        self.inner
            .put(&Self::store_path(id), PutPayload::from(data.to_vec()))
            .await
            .map_err(|e| BlobStoreError::WriteFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, BlobStoreError> {
        let result = self
            .inner
            .get(&Self::store_path(id))
            .await
            .map_err(|e| match e {
                object_store::Error::NotFound { .. } => BlobStoreError::NotFound(id.to_string()),
                other => BlobStoreError::ReadFailed(other.to_string()),
            })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| BlobStoreError::ReadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
