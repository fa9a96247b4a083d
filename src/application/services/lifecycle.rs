use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{DocumentRepository, RepositoryError};
use crate::domain::{AnalysisStatus, DocumentId};

/// Point-in-time view of one document's ingestion progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub status: AnalysisStatus,
    pub chunks_analyzed: u32,
    pub chunks_total: Option<u32>,
    pub failure_reason: Option<String>,
}

impl ProgressSnapshot {
    fn initial() -> Self {
        Self {
            status: AnalysisStatus::Pending,
            chunks_analyzed: 0,
            chunks_total: None,
            failure_reason: None,
        }
    }
}

/// Single source of truth for ingestion progress.
///
/// Holds a per-document snapshot map for cheap polling and writes every
/// status change through to the documents table. Transitions only move
/// forward through the pipeline stages; `Failed` is reachable from any
/// non-terminal state and carries a reason. Nothing here infers completion
/// from inactivity; only finished pipeline stages drive transitions.
pub struct LifecycleTracker {
    documents: Arc<dyn DocumentRepository>,
    states: RwLock<HashMap<DocumentId, ProgressSnapshot>>,
}

impl LifecycleTracker {
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self {
            documents,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new run for `id`. Returns false when a run for the same
    /// document is already in flight, so the caller coalesces instead of
    /// starting a second one.
    pub async fn try_begin(&self, id: &DocumentId) -> bool {
        let mut states = self.states.write().await;
        match states.get(id) {
            Some(existing) if !existing.status.is_terminal() => false,
            _ => {
                states.insert(id.clone(), ProgressSnapshot::initial());
                true
            }
        }
    }

    /// Forgets a claimed run that never started. Without this a failed
    /// registration would leave the slot non-terminal forever and every
    /// retry upload would coalesce into a run that does not exist.
    pub async fn release(&self, id: &DocumentId) {
        self.states.write().await.remove(id);
    }

    /// Moves the document to the next pipeline stage. Backward or repeated
    /// transitions are rejected; use `fail` for the failure path.
    pub async fn advance(
        &self,
        id: &DocumentId,
        status: AnalysisStatus,
    ) -> Result<(), TransitionError> {
        if status == AnalysisStatus::Failed {
            return Err(TransitionError::UseFailPath);
        }

        {
            let mut states = self.states.write().await;
            let snapshot = states
                .get_mut(id)
                .ok_or_else(|| TransitionError::UnknownDocument(id.clone()))?;

            if status.rank() <= snapshot.status.rank() {
                return Err(TransitionError::Backward {
                    from: snapshot.status,
                    to: status,
                });
            }
            snapshot.status = status;
        }

        tracing::debug!(document_id = %id, status = %status, "Lifecycle transition");

        let completed_at = (status == AnalysisStatus::Completed).then(Utc::now);
        self.documents
            .update_status(id, status, None, completed_at)
            .await?;

        Ok(())
    }

    /// Terminal failure with a reason. A no-op when the document already
    /// reached a terminal state.
    pub async fn fail(&self, id: &DocumentId, reason: &str) -> Result<(), TransitionError> {
        {
            let mut states = self.states.write().await;
            let snapshot = states
                .get_mut(id)
                .ok_or_else(|| TransitionError::UnknownDocument(id.clone()))?;

            if snapshot.status.is_terminal() {
                tracing::warn!(document_id = %id, status = %snapshot.status, "Ignoring failure on terminal document");
                return Ok(());
            }
            snapshot.status = AnalysisStatus::Failed;
            snapshot.failure_reason = Some(reason.to_string());
        }

        tracing::error!(document_id = %id, reason = %reason, "Document analysis failed");

        self.documents
            .update_status(id, AnalysisStatus::Failed, Some(reason), None)
            .await?;

        Ok(())
    }

    pub async fn set_total_chunks(&self, id: &DocumentId, total: u32) {
        let mut states = self.states.write().await;
        if let Some(snapshot) = states.get_mut(id) {
            snapshot.chunks_total = Some(total);
        }
    }

    /// Bumps the analyzed-chunk counter. Monotonically non-decreasing for
    /// the lifetime of the run.
    pub async fn record_chunk_analyzed(&self, id: &DocumentId) -> u32 {
        let mut states = self.states.write().await;
        match states.get_mut(id) {
            Some(snapshot) => {
                snapshot.chunks_analyzed += 1;
                snapshot.chunks_analyzed
            }
            None => 0,
        }
    }

    /// Pure read of the current snapshot; never blocks on in-flight work.
    pub async fn snapshot(&self, id: &DocumentId) -> Option<ProgressSnapshot> {
        self.states.read().await.get(id).cloned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("backward lifecycle transition: {from} -> {to}")]
    Backward {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },
    #[error("no tracked run for document {0}")]
    UnknownDocument(DocumentId),
    #[error("failure transitions go through fail()")]
    UseFailPath,
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
