use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::ports::BlobStoreError;
use crate::domain::DocumentId;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Serves the original uploaded bytes so viewers can overlay finding
/// coordinates on the rendered pages.
#[tracing::instrument(skip(state))]
pub async fn pdf_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    let id = match DocumentId::parse(&document_id) {
        Ok(id) => id,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    match state.blobs.fetch(&id).await {
        Ok(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            data,
        )
            .into_response(),
        Err(BlobStoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Document not found: {}", document_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read stored PDF");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to read PDF: {}", e),
                }),
            )
                .into_response()
        }
    }
}
