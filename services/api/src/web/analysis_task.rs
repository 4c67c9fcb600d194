//! services/api/src/web/analysis_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! taking a single document through clause analysis.

use crate::web::state::AppState;
use chrono::Utc;
use docureview_core::{
    aggregator::summarize,
    domain::{DocumentAnalysis, DocumentKind, DocumentRecord, DocumentStatus, DomainError},
    ports::{PortError, PortResult},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Why an analysis could not be started.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Port(#[from] PortError),
    /// The document is not in a state that allows a new analysis.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Moves the document to `Processing` and persists it.
///
/// The write only lands if the stored status is still the one the transition
/// was checked against, so of two concurrent requests exactly one wins.
/// Returns the updated record, ready to be handed to `analysis_process`.
pub async fn start_analysis(
    app_state: &AppState,
    document_id: Uuid,
) -> Result<DocumentRecord, AnalysisError> {
    let mut record = app_state.store.get_document(document_id).await?;
    let observed = record.status;
    record.begin_analysis()?;
    if !app_state
        .store
        .update_document_if(&record, &[observed])
        .await?
    {
        let current = app_state.store.get_document(document_id).await?;
        return Err(DomainError::InvalidTransition {
            from: current.status,
            action: "begin analysis of",
        }
        .into());
    }
    info!("Document {} queued for analysis", record.id);
    Ok(record)
}

/// The main asynchronous task for analyzing one `Processing` document.
///
/// Ends with the record either `Completed` (analysis stored) or `Failed`
/// (reason recorded). If the completed record cannot be written it is
/// recorded as `Failed` instead, so the document stays retryable. The
/// returned error only covers failing to persist any final state.
pub async fn analysis_process(
    app_state: Arc<AppState>,
    mut record: DocumentRecord,
) -> PortResult<DocumentRecord> {
    let start_time = Instant::now();
    info!("Analysis of '{}' ({}) started.", record.name, record.id);

    let outcome: PortResult<DocumentAnalysis> = async {
        let text = load_text(&app_state, &record).await?;

        let hint = match record.kind {
            DocumentKind::Unknown => None,
            kind => Some(kind.as_str()),
        };
        let timeout = app_state.config.analysis_timeout;
        let extracted = tokio::time::timeout(
            timeout,
            app_state.extractor.extract_clauses(&text, hint),
        )
        .await
        .map_err(|_| PortError::Timeout(timeout.as_secs()))??;

        let analysis = DocumentAnalysis {
            document_id: record.id,
            findings: extracted.findings,
            narrative: extracted.narrative,
            model: app_state.extractor.model_label(),
            analyzed_at: Utc::now(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };
        app_state.store.save_analysis(&analysis).await?;
        Ok(analysis)
    }
    .await;

    let processing = record.clone();
    let transition = match outcome {
        Ok(analysis) => {
            let summary = summarize(&analysis.findings);
            info!(
                "Analysis of {} completed in {:?}: {} clauses, overall risk {}",
                record.id,
                start_time.elapsed(),
                summary.clause_count,
                summary.overall_risk_level
            );
            record.complete(&summary)
        }
        Err(e) => {
            warn!("Analysis of {} failed: {}", record.id, e);
            record.fail(e.to_string())
        }
    };
    transition.map_err(|e| PortError::Unexpected(e.to_string()))?;

    let Err(e) = app_state.store.update_document(&record).await else {
        return Ok(record);
    };
    error!("Failed to persist analysis outcome for {}: {:?}", record.id, e);
    if record.status != DocumentStatus::Completed {
        return Err(e);
    }

    let mut record = processing;
    record
        .fail(format!("The analysis result could not be recorded: {}", e))
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    app_state.store.update_document(&record).await?;
    Ok(record)
}

/// Stored text first, then the blob itself if it is UTF-8.
async fn load_text(app_state: &AppState, record: &DocumentRecord) -> PortResult<String> {
    let text = match app_state.store.get_document_text(record.id).await? {
        Some(text) => text,
        None => {
            let bytes = app_state.blobs.get(&record.blob_key).await?;
            String::from_utf8(bytes).map_err(|_| {
                PortError::Malformed(format!(
                    "'{}' is not a plain-text document and cannot be analyzed",
                    record.name
                ))
            })?
        }
    };

    if text.trim().is_empty() {
        return Err(PortError::Malformed(format!(
            "'{}' contains no text to analyze",
            record.name
        )));
    }
    Ok(text)
}
