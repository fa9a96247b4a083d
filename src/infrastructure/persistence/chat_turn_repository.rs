use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{ChatTurnRepository, RepositoryError};
use crate::domain::{ChatRole, ChatTurn, ChatTurnId, FindingId};

pub struct SqliteChatTurnRepository {
    pool: SqlitePool,
}

impl SqliteChatTurnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl ChatTurnRepository for SqliteChatTurnRepository {
    #[instrument(skip(self, turn), fields(finding_id = %turn.finding_id, role = turn.role.as_str()))]
    async fn append(&self, turn: &ChatTurn) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chat_turns (id, finding_id, role, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(turn.id.as_uuid().to_string())
        .bind(turn.finding_id.as_uuid().to_string())
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(turn.created_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(finding_id = %finding_id))]
    async fn list_for_finding(
        &self,
        finding_id: FindingId,
    ) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, finding_id, role, content, created_at
            FROM chat_turns
            WHERE finding_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(finding_id.as_uuid().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(query_failed)?;
                let finding: String = row.try_get("finding_id").map_err(query_failed)?;
                let role: String = row.try_get("role").map_err(query_failed)?;

                Ok(ChatTurn {
                    id: ChatTurnId::from_uuid(Uuid::parse_str(&id).map_err(query_failed)?),
                    finding_id: FindingId::from_uuid(
                        Uuid::parse_str(&finding).map_err(query_failed)?,
                    ),
                    role: role
                        .parse::<ChatRole>()
                        .map_err(RepositoryError::QueryFailed)?,
                    content: row.try_get("content").map_err(query_failed)?,
                    created_at: row
                        .try_get::<DateTime<Utc>, _>("created_at")
                        .map_err(query_failed)?,
                })
            })
            .collect()
    }
}
