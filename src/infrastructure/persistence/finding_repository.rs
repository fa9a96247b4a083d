use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{FindingFilter, FindingRepository, RepositoryError};
use crate::domain::{
    BoundingBox, ChunkId, ConcernCategory, DocumentId, Finding, FindingId, Severity,
};

/// Severity has a domain ordering the lexicographic TEXT column does not;
/// listings sort through this CASE expression instead.
const SEVERITY_ORDER: &str =
    "CASE severity WHEN 'CRITICAL' THEN 3 WHEN 'HIGH' THEN 2 WHEN 'MEDIUM' THEN 1 ELSE 0 END";

pub struct SqliteFindingRepository {
    pool: SqlitePool,
}

impl SqliteFindingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn row_to_finding(row: &SqliteRow) -> Result<Finding, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_failed)?;
    let document_id: String = row.try_get("document_id").map_err(query_failed)?;
    let chunk_id: String = row.try_get("chunk_id").map_err(query_failed)?;
    let category: String = row.try_get("category").map_err(query_failed)?;
    let severity: String = row.try_get("severity").map_err(query_failed)?;
    let coordinates: String = row.try_get("coordinates").map_err(query_failed)?;

    let [x0, y0, x1, y1]: [f32; 4] =
        serde_json::from_str(&coordinates).map_err(query_failed)?;

    Ok(Finding {
        id: FindingId::from_uuid(Uuid::parse_str(&id).map_err(query_failed)?),
        document_id: DocumentId::parse(&document_id).map_err(RepositoryError::QueryFailed)?,
        chunk_id: ChunkId::from_uuid(Uuid::parse_str(&chunk_id).map_err(query_failed)?),
        category: category
            .parse::<ConcernCategory>()
            .map_err(RepositoryError::QueryFailed)?,
        severity: severity
            .parse::<Severity>()
            .map_err(RepositoryError::QueryFailed)?,
        summary: row.try_get("summary").map_err(query_failed)?,
        recommendation: row.try_get("recommendation").map_err(query_failed)?,
        confidence: row.try_get::<f64, _>("confidence_score").map_err(query_failed)? as f32,
        page_start: row.try_get::<i64, _>("page_num").map_err(query_failed)? as u32,
        page_end: row.try_get::<i64, _>("page_end").map_err(query_failed)? as u32,
        region: BoundingBox::new(x0, y0, x1, y1),
        text_content: row.try_get("text_content").map_err(query_failed)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_failed)?,
    })
}

#[async_trait]
impl FindingRepository for SqliteFindingRepository {
    #[instrument(skip(self, findings), fields(count = findings.len()))]
    async fn insert_all(&self, findings: &[Finding]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        for finding in findings {
            sqlx::query(
                r#"
                INSERT INTO findings
                    (id, document_id, chunk_id, page_num, page_end, coordinates, text_content,
                     category, severity, summary, recommendation, confidence_score, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(finding.id.as_uuid().to_string())
            .bind(finding.document_id.as_str())
            .bind(finding.chunk_id.as_uuid().to_string())
            .bind(finding.page_start as i64)
            .bind(finding.page_end as i64)
            .bind(serde_json::to_string(&finding.region.as_array()).map_err(query_failed)?)
            .bind(&finding.text_content)
            .bind(finding.category.as_str())
            .bind(finding.severity.as_str())
            .bind(&finding.summary)
            .bind(&finding.recommendation)
            .bind(finding.confidence as f64)
            .bind(finding.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    RepositoryError::ConstraintViolation(e.to_string())
                }
                _ => query_failed(e),
            })?;
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self), fields(finding_id = %id))]
    async fn get_by_id(&self, id: FindingId) -> Result<Option<Finding>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM findings WHERE id = ?1")
            .bind(id.as_uuid().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(row_to_finding).transpose()
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn list_for_document(
        &self,
        document_id: &DocumentId,
        filter: FindingFilter,
    ) -> Result<Vec<Finding>, RepositoryError> {
        let limit = filter.limit.unwrap_or(100).min(500) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;

        let sql = format!(
            r#"
            SELECT * FROM findings
            WHERE document_id = ?1 AND (?2 IS NULL OR category = ?2)
            ORDER BY {SEVERITY_ORDER} DESC, confidence_score DESC, id
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(document_id.as_str())
            .bind(filter.category.map(|c| c.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        rows.iter().map(row_to_finding).collect()
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn count_for_document(&self, document_id: &DocumentId) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM findings WHERE document_id = ?1")
            .bind(document_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed)?;

        let n: i64 = row.try_get("n").map_err(query_failed)?;
        Ok(n as u64)
    }
}
