//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.
//! Domain enums travel as their lowercase labels.

use chrono::{DateTime, Utc};
use docureview_core::{
    domain::{
        format_file_size, ClauseFinding, Comment, DocumentAnalysis, DocumentRecord,
        DocumentRiskSummary,
    },
    ports::{ChatMessage, ChatRole},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Documents
//=========================================================================================

/// One document as shown in the document list.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    /// `Contract`, `Agreement`, `Document` or `Unknown`.
    pub kind: String,
    /// `pending`, `processing`, `completed` or `failed`.
    pub status: String,
    pub risk_level: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// Human-readable size, e.g. `1.5 KB`.
    pub size: String,
    pub collaborator_count: u32,
    pub url: String,
    pub failure_reason: Option<String>,
}

impl From<&DocumentRecord> for DocumentResponse {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            kind: record.kind.as_str().to_string(),
            status: record.status.as_str().to_string(),
            risk_level: record.risk_level.map(|level| level.as_str().to_string()),
            uploaded_at: record.uploaded_at,
            size_bytes: record.size_bytes,
            size: format_file_size(record.size_bytes),
            collaborator_count: record.collaborator_count,
            url: record.blob_url.clone(),
            failure_reason: record.failure_reason.clone(),
        }
    }
}

/// The response payload sent after a successful upload.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct UploadResponse {
    pub documents: Vec<DocumentResponse>,
}

/// Query parameters accepted by the document list.
#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ListDocumentsQuery {
    /// Case-insensitive substring of the document name.
    pub q: Option<String>,
    /// `all` (the default) or one document status.
    pub status: Option<String>,
}

//=========================================================================================
// Analyses
//=========================================================================================

/// The document-level roll-up of a set of findings.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct RiskSummaryResponse {
    pub clause_count: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub average_confidence: u8,
    pub overall_risk_level: String,
    pub overall_risk_score: u8,
}

impl From<&DocumentRiskSummary> for RiskSummaryResponse {
    fn from(summary: &DocumentRiskSummary) -> Self {
        Self {
            clause_count: summary.clause_count,
            high_risk_count: summary.high_risk_count,
            medium_risk_count: summary.medium_risk_count,
            low_risk_count: summary.low_risk_count,
            average_confidence: summary.average_confidence,
            overall_risk_level: summary.overall_risk_level.as_str().to_string(),
            overall_risk_score: summary.overall_risk_score,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SpanResponse {
    pub start: usize,
    pub end: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ClauseResponse {
    pub id: String,
    pub clause_type: String,
    pub content: String,
    pub risk_level: String,
    pub confidence: u8,
    pub suggestions: Vec<String>,
    pub position: SpanResponse,
}

impl From<&ClauseFinding> for ClauseResponse {
    fn from(finding: &ClauseFinding) -> Self {
        Self {
            id: finding.id.clone(),
            clause_type: finding.clause_type.clone(),
            content: finding.content.clone(),
            risk_level: finding.risk_level.as_str().to_string(),
            confidence: finding.confidence.get(),
            suggestions: finding.suggestions.clone(),
            position: SpanResponse {
                start: finding.position.start(),
                end: finding.position.end(),
            },
        }
    }
}

/// A stored analysis together with its freshly computed summary.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AnalysisResponse {
    pub document_id: Uuid,
    pub model: String,
    pub analyzed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub narrative: String,
    pub summary: RiskSummaryResponse,
    pub clauses: Vec<ClauseResponse>,
}

impl AnalysisResponse {
    pub fn new(analysis: &DocumentAnalysis, summary: &DocumentRiskSummary) -> Self {
        Self {
            document_id: analysis.document_id,
            model: analysis.model.clone(),
            analyzed_at: analysis.analyzed_at,
            processing_time_ms: analysis.processing_time_ms,
            narrative: analysis.narrative.clone(),
            summary: summary.into(),
            clauses: analysis.findings.iter().map(ClauseResponse::from).collect(),
        }
    }
}

/// Sent when an analysis has been queued.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AnalysisAccepted {
    pub document_id: Uuid,
    pub status: String,
}

//=========================================================================================
// Comments
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CommentResponse {
    pub id: Uuid,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub clause_id: Option<String>,
    /// Whether `clause_id` names a clause of the latest analysis.
    pub attached: bool,
}

impl CommentResponse {
    pub fn new(comment: &Comment, findings: &[ClauseFinding]) -> Self {
        Self {
            id: comment.id,
            author: comment.author.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            clause_id: comment.clause_id.clone(),
            attached: comment.resolve_clause(findings).is_some(),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct CreateCommentRequest {
    pub content: String,
    /// Defaults to `You`.
    pub author: Option<String>,
    pub clause_id: Option<String>,
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRoleDto {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ChatMessageDto {
    pub role: ChatRoleDto,
    pub content: String,
}

impl From<&ChatMessageDto> for ChatMessage {
    fn from(message: &ChatMessageDto) -> Self {
        ChatMessage {
            role: match message.role {
                ChatRoleDto::User => ChatRole::User,
                ChatRoleDto::Assistant => ChatRole::Assistant,
            },
            content: message.content.clone(),
        }
    }
}

/// A chat turn. Context comes from `document_id` when given, else `document_context`.
#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessageDto>,
    pub document_id: Option<Uuid>,
    pub document_context: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use docureview_core::{aggregator::summarize, fixtures};
    use pretty_assertions::assert_eq;

    #[test]
    fn document_response_formats_size_and_labels() {
        let record = fixtures::sample_documents().remove(0);
        let response = DocumentResponse::from(&record);
        assert_eq!(response.size, "2.3 KB");
        assert_eq!(response.status, "completed");
        assert_eq!(response.risk_level.as_deref(), Some("medium"));
        assert_eq!(response.kind, "Contract");
    }

    #[test]
    fn comment_response_flags_dangling_clause_ids() {
        let findings = fixtures::sample_findings();
        let attached = Comment::new("You", "ok", Some("clause-1".to_string())).unwrap();
        let dangling = Comment::new("You", "ok", Some("clause-9".to_string())).unwrap();
        assert!(CommentResponse::new(&attached, &findings).attached);
        assert!(!CommentResponse::new(&dangling, &findings).attached);
    }

    #[test]
    fn chat_roles_use_lowercase_labels() {
        let dto: ChatMessageDto =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(ChatMessage::from(&dto).role, ChatRole::Assistant);
    }

    #[test]
    fn analysis_response_carries_summary() {
        let findings = fixtures::sample_findings();
        let analysis = DocumentAnalysis {
            document_id: Uuid::new_v4(),
            findings: findings.clone(),
            narrative: "n".to_string(),
            model: "m".to_string(),
            analyzed_at: Utc::now(),
            processing_time_ms: 5,
        };
        let response = AnalysisResponse::new(&analysis, &summarize(&findings));
        assert_eq!(response.summary.overall_risk_level, "high");
        assert_eq!(response.summary.overall_risk_score, 50);
        assert_eq!(response.clauses.len(), 3);
    }
}
