use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    analysis_handler, chat_handler, findings_handler, health_handler, ingest_handler, pdf_handler,
    progress_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Multipart body limit tracks the configured upload cap, with headroom
    // for the multipart framing.
    let body_limit = (state.settings.storage.max_file_size_mb + 1) * 1024 * 1024;

    Router::new()
        .route("/health", get(health_handler))
        .route("/ingest", post(ingest_handler))
        .route("/progress/{document_id}", get(progress_handler))
        .route("/analysis/{document_id}", get(analysis_handler))
        .route("/findings/{document_id}", get(findings_handler))
        .route("/findings/{finding_id}/chat", post(chat_handler))
        .route("/documents/{document_id}/pdf", get(pdf_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
