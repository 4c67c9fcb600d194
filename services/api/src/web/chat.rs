//! services/api/src/web/chat.rs
//!
//! The legal assistant chat endpoint. Answers are streamed back as
//! server-sent events: one `message` event per text chunk, then `done`.
//! A failure mid-stream is reported as an `error` event before `done`.

use crate::web::{
    protocol::ChatRequest,
    rest::port_failure,
    state::AppState,
};
use async_stream::stream;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use docureview_core::ports::{ChatMessage, PortError};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Builds the assistant's view of a stored document: its name, its text
/// and the narrative of its latest analysis, whichever exist.
async fn stored_document_context(
    app_state: &AppState,
    document_id: Uuid,
) -> Result<String, (StatusCode, String)> {
    let record = app_state
        .store
        .get_document(document_id)
        .await
        .map_err(|e| port_failure("Failed to load document", e))?;

    let mut context = format!("Document: {}", record.name);
    let text = app_state
        .store
        .get_document_text(document_id)
        .await
        .map_err(|e| port_failure("Failed to load document text", e))?;
    if let Some(text) = text {
        context.push_str("\n\n");
        context.push_str(&text);
    }

    match app_state.store.get_analysis(document_id).await {
        Ok(analysis) if !analysis.narrative.is_empty() => {
            context.push_str("\n\nRisk analysis: ");
            context.push_str(&analysis.narrative);
        }
        Ok(_) | Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(port_failure("Failed to load analysis", e)),
    }
    Ok(context)
}

/// Ask the legal assistant about a document.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer chunks as server-sent events", content_type = "text/event-stream", body = String),
        (status = 400, description = "No messages"),
        (status = 404, description = "Unknown document_id")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    if request.messages.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "At least one message is required".to_string(),
        ));
    }

    let context = match request.document_id {
        Some(document_id) => Some(stored_document_context(&app_state, document_id).await?),
        None => request.document_context.filter(|c| !c.trim().is_empty()),
    };
    let messages: Vec<ChatMessage> = request.messages.iter().map(ChatMessage::from).collect();

    let mut upstream = app_state
        .assistant
        .answer_streaming(&messages, context.as_deref())
        .await
        .map_err(|e| port_failure("Failed to reach the legal assistant", e))?;
    info!("Streaming assistant answer for {} messages", messages.len());

    let events = stream! {
        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(text) => yield Ok::<Event, Infallible>(Event::default().data(text)),
                Err(e) => {
                    warn!("Assistant stream failed: {}", e);
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    break;
                }
            }
        }
        yield Ok(Event::default().event("done").data("[DONE]"));
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
