use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::application::ports::FindingFilter;
use crate::domain::{ConcernCategory, DocumentId, Finding};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct FindingsQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct FindingsResponse {
    pub document_id: String,
    pub total: u64,
    pub findings: Vec<FindingView>,
}

#[derive(Serialize)]
pub struct FindingView {
    pub id: String,
    pub chunk_id: String,
    pub category: String,
    pub severity: String,
    pub summary: String,
    pub recommendation: Option<String>,
    pub confidence: f32,
    pub page_start: u32,
    pub page_end: u32,
    pub coordinates: [f32; 4],
    pub text_content: String,
    pub created_at: String,
}

impl From<Finding> for FindingView {
    fn from(f: Finding) -> Self {
        Self {
            id: f.id.to_string(),
            chunk_id: f.chunk_id.to_string(),
            category: f.category.as_str().to_string(),
            severity: f.severity.as_str().to_string(),
            summary: f.summary,
            recommendation: f.recommendation,
            confidence: f.confidence,
            page_start: f.page_start,
            page_end: f.page_end,
            coordinates: f.region.as_array(),
            text_content: f.text_content,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, query))]
pub async fn findings_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    Query(query): Query<FindingsQuery>,
) -> impl IntoResponse {
    let id = match DocumentId::parse(&document_id) {
        Ok(id) => id,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    let category = match query.category.as_deref() {
        Some(raw) => match raw.parse::<ConcernCategory>() {
            Ok(c) => Some(c),
            Err(e) => {
                return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e }))
                    .into_response();
            }
        },
        None => None,
    };

    let filter = FindingFilter {
        category,
        limit: query.limit,
        offset: query.offset,
    };

    let findings = match state.findings.list_for_document(&id, filter).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list findings");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to list findings: {}", e),
                }),
            )
                .into_response();
        }
    };

    let total = match state.findings.count_for_document(&id).await {
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
        Json(FindingsResponse {
            document_id: id.to_string(),
            total,
            findings: findings.into_iter().map(FindingView::from).collect(),
        }),
    )
        .into_response()
}
