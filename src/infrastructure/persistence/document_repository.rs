use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::application::ports::{DocumentRepository, RepositoryError};
use crate::domain::{AnalysisStatus, Document, DocumentId};

pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

impl SqliteDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn create(&self, document: &Document) -> Result<(), RepositoryError> {
        // OR REPLACE: restarting a failed run resets the existing row.
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO documents
                (id, filename, upload_date, total_pages, analysis_status, failure_reason, analysis_completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(document.id.as_str())
        .bind(&document.filename)
        .bind(document.upload_date)
        .bind(document.total_pages as i64)
        .bind(document.status.as_str())
        .bind(&document.failure_reason)
        .bind(document.analysis_completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn get_by_id(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, upload_date, total_pages, analysis_status, failure_reason, analysis_completed_at
            FROM documents
            WHERE id = ?1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(r) => {
                let id: String = r
                    .try_get("id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
                let status: String = r
                    .try_get("analysis_status")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

                Ok(Some(Document {
                    id: DocumentId::parse(&id).map_err(RepositoryError::QueryFailed)?,
                    filename: r
                        .try_get("filename")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    upload_date: r
                        .try_get::<DateTime<Utc>, _>("upload_date")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    total_pages: r
                        .try_get::<i64, _>("total_pages")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?
                        as u32,
                    status: status.parse::<AnalysisStatus>().map_err(RepositoryError::QueryFailed)?,
                    failure_reason: r
                        .try_get("failure_reason")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    analysis_completed_at: r
                        .try_get::<Option<DateTime<Utc>>, _>("analysis_completed_at")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, failure_reason), fields(document_id = %id, status = %status))]
    async fn update_status(
        &self,
        id: &DocumentId,
        status: AnalysisStatus,
        failure_reason: Option<&str>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE documents
            SET analysis_status = ?1,
                failure_reason = ?2,
                analysis_completed_at = COALESCE(?3, analysis_completed_at)
            WHERE id = ?4
            "#,
        )
        .bind(status.as_str())
        .bind(failure_reason)
        .bind(completed_at)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn set_total_pages(
        &self,
        id: &DocumentId,
        total_pages: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE documents SET total_pages = ?1 WHERE id = ?2")
            .bind(total_pages as i64)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
