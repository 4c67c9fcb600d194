//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    analysis_task::{analysis_process, start_analysis, AnalysisError},
    protocol::{
        AnalysisAccepted, AnalysisResponse, ChatMessageDto, ChatRequest, ChatRoleDto,
        ClauseResponse, CommentResponse, CreateCommentRequest, DocumentResponse, HealthResponse,
        ListDocumentsQuery, RiskSummaryResponse, SpanResponse, UploadResponse,
    },
    state::AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use docureview_core::{
    aggregator::{filter_documents, summarize, StatusFilter},
    domain::{ClauseFinding, Comment, DocumentKind, DocumentRecord, DomainError},
    ports::{NewDocument, PortError},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        upload_documents_handler,
        list_documents_handler,
        get_document_handler,
        request_analysis_handler,
        get_analysis_handler,
        list_comments_handler,
        create_comment_handler,
        get_blob_handler,
        crate::web::chat::chat_handler,
    ),
    components(
        schemas(
            HealthResponse,
            DocumentResponse,
            UploadResponse,
            AnalysisAccepted,
            AnalysisResponse,
            RiskSummaryResponse,
            ClauseResponse,
            SpanResponse,
            CommentResponse,
            CreateCommentRequest,
            ChatRequest,
            ChatMessageDto,
            ChatRoleDto,
        )
    ),
    tags(
        (name = "DocuReview API", description = "Upload legal documents, analyze clause risk and collaborate on the findings.")
    )
)]
pub struct ApiDoc;

const DEFAULT_AUTHOR: &str = "You";
const UPLOAD_FIELD: &str = "files";

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Turns a port failure into a response, logging anything that is not the caller's fault.
pub(crate) fn port_failure(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Timeout(_) => {
            error!("{}: {:?}", context, e);
            (StatusCode::GATEWAY_TIMEOUT, context.to_string())
        }
        _ => {
            error!("{}: {:?}", context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

async fn load_document(
    app_state: &AppState,
    document_id: Uuid,
) -> Result<DocumentRecord, (StatusCode, String)> {
    app_state
        .store
        .get_document(document_id)
        .await
        .map_err(|e| port_failure("Failed to load document", e))
}

/// The findings comments are resolved against; none before the first analysis.
async fn current_findings(
    app_state: &AppState,
    document_id: Uuid,
) -> Result<Vec<ClauseFinding>, (StatusCode, String)> {
    match app_state.store.get_analysis(document_id).await {
        Ok(analysis) => Ok(analysis.findings),
        Err(PortError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(port_failure("Failed to load analysis", e)),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// One file part, read and size-checked but not yet stored.
struct ReceivedFile {
    file_name: String,
    is_plain_text: bool,
    data: Vec<u8>,
}

/// Upload one or more documents.
///
/// Accepts a multipart/form-data request; every `files` part becomes a
/// `pending` document. Plain-text files keep their text for analysis. Every
/// part is read and checked before anything is stored, and the records are
/// written as one batch, so a rejected request leaves no documents behind.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts."),
    responses(
        (status = 201, description = "Documents stored", body = UploadResponse),
        (status = 400, description = "No file in the request"),
        (status = 413, description = "A file exceeds the upload limit"),
        (status = 502, description = "The blob store rejected a file"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_documents_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let max_bytes = app_state.config.max_upload_bytes;
    let mut received = Vec::new();

    // --- 1. Read and check every part ---
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            e.status(),
            format!("Failed to read multipart data: {}", e.body_text()),
        )
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let is_plain_text = field.content_type() == Some("text/plain")
            || DocumentKind::from_filename(&file_name) == DocumentKind::Document;

        let data = field.bytes().await.map_err(|e| {
            (
                e.status(),
                format!("Failed to read file bytes: {}", e.body_text()),
            )
        })?;
        if data.len() > max_bytes {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("'{}' exceeds the {} byte upload limit", file_name, max_bytes),
            ));
        }
        received.push(ReceivedFile {
            file_name,
            is_plain_text,
            data: data.to_vec(),
        });
    }

    if received.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        ));
    }

    // --- 2. Store the bytes ---
    let mut uploads = Vec::with_capacity(received.len());
    for file in received {
        let blob = app_state
            .blobs
            .put(&file.file_name, &file.data)
            .await
            .map_err(|e| {
                error!("Blob upload of '{}' failed: {:?}", file.file_name, e);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Failed to store '{}'", file.file_name),
                )
            })?;

        let text = match (file.is_plain_text, String::from_utf8(file.data)) {
            (true, Ok(text)) => Some(text),
            (true, Err(_)) => {
                warn!("'{}' claims to be text but is not UTF-8", file.file_name);
                None
            }
            (false, _) => None,
        };
        uploads.push(NewDocument {
            record: DocumentRecord::new_upload(file.file_name, &blob),
            text,
        });
    }

    // --- 3. Record the documents ---
    app_state
        .store
        .insert_documents(&uploads)
        .await
        .map_err(|e| port_failure("Failed to record documents", e))?;

    let documents: Vec<DocumentResponse> = uploads
        .iter()
        .map(|upload| {
            info!("Uploaded '{}' as {}", upload.record.name, upload.record.id);
            DocumentResponse::from(&upload.record)
        })
        .collect();

    Ok((StatusCode::CREATED, Json(UploadResponse { documents })))
}

/// List documents, optionally filtered by name and status.
#[utoipa::path(
    get,
    path = "/documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Matching documents in upload order", body = [DocumentResponse]),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let status = match query.status.as_deref() {
        Some(raw) => raw
            .parse::<StatusFilter>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => StatusFilter::All,
    };

    let documents = app_state
        .store
        .list_documents()
        .await
        .map_err(|e| port_failure("Failed to list documents", e))?;

    let matching = filter_documents(&documents, query.q.as_deref().unwrap_or(""), status);
    let response: Vec<DocumentResponse> = matching.iter().map(DocumentResponse::from).collect();
    Ok(Json(response))
}

/// Fetch one document record.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document", body = DocumentResponse),
        (status = 404, description = "No such document")
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = load_document(&app_state, document_id).await?;
    Ok(Json(DocumentResponse::from(&record)))
}

/// Queue a clause analysis of the document.
///
/// The analysis runs in the background; poll the document until its status
/// is `completed` or `failed`.
#[utoipa::path(
    post,
    path = "/documents/{id}/analysis",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 202, description = "Analysis started", body = AnalysisAccepted),
        (status = 404, description = "No such document"),
        (status = 409, description = "The document is already processing or completed")
    )
)]
pub async fn request_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = start_analysis(&app_state, document_id)
        .await
        .map_err(|e| match e {
            AnalysisError::Domain(e @ DomainError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, e.to_string())
            }
            AnalysisError::Domain(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AnalysisError::Port(e) => port_failure("Failed to start analysis", e),
        })?;

    let response = AnalysisAccepted {
        document_id: record.id,
        status: record.status.as_str().to_string(),
    };

    let task_state = app_state.clone();
    tokio::spawn(async move {
        if let Err(e) = analysis_process(task_state, record).await {
            error!("Analysis task for {} ended with an error: {:?}", document_id, e);
        }
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Fetch the latest analysis, with its risk summary computed from the findings.
#[utoipa::path(
    get,
    path = "/documents/{id}/analysis",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The analysis", body = AnalysisResponse),
        (status = 404, description = "No such document, or not analyzed yet")
    )
)]
pub async fn get_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    load_document(&app_state, document_id).await?;
    let analysis = app_state
        .store
        .get_analysis(document_id)
        .await
        .map_err(|e| port_failure("Failed to load analysis", e))?;

    let summary = summarize(&analysis.findings);
    Ok(Json(AnalysisResponse::new(&analysis, &summary)))
}

/// List a document's comments in the order they were made.
#[utoipa::path(
    get,
    path = "/documents/{id}/comments",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The comments", body = [CommentResponse]),
        (status = 404, description = "No such document")
    )
)]
pub async fn list_comments_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let comments = app_state
        .store
        .list_comments(document_id)
        .await
        .map_err(|e| port_failure("Failed to list comments", e))?;
    let findings = current_findings(&app_state, document_id).await?;

    let response: Vec<CommentResponse> = comments
        .iter()
        .map(|comment| CommentResponse::new(comment, &findings))
        .collect();
    Ok(Json(response))
}

/// Add a comment, optionally pinned to a clause.
#[utoipa::path(
    post,
    path = "/documents/{id}/comments",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Blank comment"),
        (status = 404, description = "No such document")
    )
)]
pub async fn create_comment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let author = payload
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let clause_id = payload
        .clause_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let comment = Comment::new(author, &payload.content, clause_id)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    app_state
        .store
        .append_comment(document_id, &comment)
        .await
        .map_err(|e| port_failure("Failed to save comment", e))?;
    let findings = current_findings(&app_state, document_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(&comment, &findings)),
    ))
}

/// Download a stored file by its blob key.
#[utoipa::path(
    get,
    path = "/blobs/{key}",
    params(("key" = String, Path, description = "Blob key")),
    responses(
        (status = 200, description = "The file bytes"),
        (status = 404, description = "No such blob")
    )
)]
pub async fn get_blob_handler(
    State(app_state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bytes = app_state
        .blobs
        .get(&key)
        .await
        .map_err(|e| port_failure("Failed to read blob", e))?;

    let content_type = match DocumentKind::from_filename(&key) {
        DocumentKind::Document => "text/plain; charset=utf-8",
        _ if key.to_ascii_lowercase().ends_with(".pdf") => "application/pdf",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
