pub mod analysis_task;
pub mod chat;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::{
    chat::chat_handler,
    rest::{
        create_comment_handler, get_analysis_handler, get_blob_handler, get_document_handler,
        health_handler, list_comments_handler, list_documents_handler, request_analysis_handler,
        upload_documents_handler, ApiDoc,
    },
    state::AppState,
};

/// Room for multipart boundaries and headers on top of the file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds the full application router, Swagger UI included.
///
/// Cross-cutting layers (CORS, tracing) are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/documents",
            get(list_documents_handler).post(upload_documents_handler),
        )
        .route("/documents/{id}", get(get_document_handler))
        .route(
            "/documents/{id}/analysis",
            get(get_analysis_handler).post(request_analysis_handler),
        )
        .route(
            "/documents/{id}/comments",
            get(list_comments_handler).post(create_comment_handler),
        )
        .route("/blobs/{key}", get(get_blob_handler))
        .route("/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
