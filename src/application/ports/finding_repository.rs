use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{ConcernCategory, DocumentId, Finding, FindingId};

/// Pagination and filtering for finding listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindingFilter {
    pub category: Option<ConcernCategory>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[async_trait]
pub trait FindingRepository: Send + Sync {
    async fn insert_all(&self, findings: &[Finding]) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: FindingId) -> Result<Option<Finding>, RepositoryError>;

    /// Lists findings for one document ordered by severity then confidence,
    /// both descending.
    async fn list_for_document(
        &self,
        document_id: &DocumentId,
        filter: FindingFilter,
    ) -> Result<Vec<Finding>, RepositoryError>;

    async fn count_for_document(&self, document_id: &DocumentId) -> Result<u64, RepositoryError>;
}
