use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::ChatError;
use crate::domain::FindingId;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct ChatResponseBody {
    pub finding_id: String,
    pub answer: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn chat_handler(
    State(state): State<AppState>,
    Path(finding_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&finding_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid finding ID: {}", finding_id),
                }),
            )
                .into_response();
        }
    };
    let id = FindingId::from_uuid(uuid);

    tracing::debug!(question = %sanitize_prompt(&request.question), "Processing finding chat");

    match state.chat_service.ask(id, &request.question).await {
        Ok(response) => (
            StatusCode::OK,
            Json(ChatResponseBody {
                finding_id: id.to_string(),
                answer: response.answer,
            }),
        )
            .into_response(),
        Err(ChatError::FindingNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Finding not found: {}", finding_id),
            }),
        )
            .into_response(),
        Err(ChatError::Validation(reason)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: reason })).into_response()
        }
        Err(e @ ChatError::ContextUnavailable) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Chat failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Chat failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}
