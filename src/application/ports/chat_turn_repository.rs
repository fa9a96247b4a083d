use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{ChatTurn, FindingId};

#[async_trait]
pub trait ChatTurnRepository: Send + Sync {
    async fn append(&self, turn: &ChatTurn) -> Result<(), RepositoryError>;

    /// Returns the finding's turns in append order.
    async fn list_for_finding(&self, finding_id: FindingId)
    -> Result<Vec<ChatTurn>, RepositoryError>;
}
