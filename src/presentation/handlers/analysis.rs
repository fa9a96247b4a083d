use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::DocumentId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub document_id: String,
    pub filename: String,
    pub total_pages: u32,
    pub upload_date: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub analysis_completed_at: Option<String>,
    pub finding_count: u64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state))]
pub async fn analysis_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    let id = match DocumentId::parse(&document_id) {
        Ok(id) => id,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    let document = match state.documents.get_by_id(&id).await {
        Ok(Some(d)) => d,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Document not found: {}", document_id),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch document");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch document: {}", e),
                }),
            )
                .into_response();
        }
    };

    let finding_count = match state.findings.count_for_document(&id).await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count findings");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to count findings: {}", e),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(AnalysisResponse {
            document_id: document.id.to_string(),
            filename: document.filename,
            total_pages: document.total_pages,
            upload_date: document.upload_date.to_rfc3339(),
            status: document.status.as_str().to_string(),
            failure_reason: document.failure_reason,
            analysis_completed_at: document.analysis_completed_at.map(|t| t.to_rfc3339()),
            finding_count,
        }),
    )
        .into_response()
}
