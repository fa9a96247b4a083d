use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::DocumentId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ProgressResponse {
    pub document_id: String,
    pub status: String,
    pub chunks_analyzed: u32,
    pub chunks_total: Option<u32>,
    pub failure_reason: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state))]
pub async fn progress_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    let id = match DocumentId::parse(&document_id) {
        Ok(id) => id,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    // Live runs answer from the in-memory tracker; documents from earlier
    // process lifetimes fall back to their persisted record.
    if let Some(snapshot) = state.tracker.snapshot(&id).await {
        return (
            StatusCode::OK,
            Json(ProgressResponse {
                document_id: id.to_string(),
                status: snapshot.status.as_str().to_string(),
                chunks_analyzed: snapshot.chunks_analyzed,
                chunks_total: snapshot.chunks_total,
                failure_reason: snapshot.failure_reason,
            }),
        )
            .into_response();
    }

    match state.documents.get_by_id(&id).await {
        Ok(Some(document)) => (
            StatusCode::OK,
            Json(ProgressResponse {
                document_id: id.to_string(),
                status: document.status.as_str().to_string(),
                chunks_analyzed: 0,
                chunks_total: None,
                failure_reason: document.failure_reason,
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Document not found: {}", document_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch document progress");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch progress: {}", e),
                }),
            )
                .into_response()
        }
    }
}
