use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::{AnalysisStatus, Document, DocumentId};

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError>;

    async fn update_status(
        &self,
        id: &DocumentId,
        status: AnalysisStatus,
        failure_reason: Option<&str>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;

    async fn set_total_pages(&self, id: &DocumentId, total_pages: u32)
    -> Result<(), RepositoryError>;
}
