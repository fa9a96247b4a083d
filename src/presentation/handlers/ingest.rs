use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::IngestError;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct IngestResponse {
    pub document_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn ingest_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => {
            tracing::warn!("Ingest request with no file");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No file uploaded".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read multipart");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Failed to read multipart: {}", e),
                }),
            )
                .into_response();
        }
    };

    let filename = field.file_name().unwrap_or("unknown.pdf").to_string();

    let data = match field.bytes().await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read file bytes");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Failed to read file: {}", e),
                }),
            )
                .into_response();
        }
    };

    tracing::debug!(filename = %filename, bytes = data.len(), "Processing file upload");

    let max_bytes = state.settings.storage.max_file_size_mb * 1024 * 1024;
    if data.len() > max_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse {
                error: format!(
                    "File exceeds maximum size of {} MB",
                    state.settings.storage.max_file_size_mb
                ),
            }),
        )
            .into_response();
    }

    match state.pipeline.ingest(data.to_vec(), filename).await {
        Ok((document_id, status)) => (
            StatusCode::ACCEPTED,
            Json(IngestResponse {
                document_id: document_id.to_string(),
                status: status.as_str().to_string(),
                message: "Document analysis started".to_string(),
            }),
        )
            .into_response(),
        Err(IngestError::Validation(reason)) => {
            tracing::warn!(reason = %reason, "Rejected upload");
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: reason })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Ingest failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Ingest failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}
