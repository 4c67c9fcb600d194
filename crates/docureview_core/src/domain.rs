//! crates/docureview_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.
//! Every value that carries an invariant (risk level, confidence, text span)
//! is validated when it is constructed, so downstream code never re-checks it.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Domain Validation Errors
//=========================================================================================

/// Errors raised when constructing or transitioning domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("'{0}' is not a valid risk level (expected low, medium or high)")]
    InvalidRiskLevel(String),
    #[error("Confidence must be between 0 and 100, got {0}")]
    InvalidConfidence(i64),
    #[error("Invalid text span [{start}, {end}) for a document of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },
    #[error("Clause id must not be empty")]
    EmptyClauseId,
    #[error("Comment content must not be empty")]
    EmptyComment,
    #[error("'{0}' is not a valid status filter")]
    InvalidStatusFilter(String),
    #[error("'{0}' is not a valid document status")]
    InvalidStatus(String),
    #[error("Cannot {action} a document that is {from}")]
    InvalidTransition {
        from: DocumentStatus,
        action: &'static str,
    },
}

//=========================================================================================
// Risk Level and Confidence
//=========================================================================================

/// Ordinal legal-risk classification. `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(DomainError::InvalidRiskLevel(s.to_string())),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Confidence(u8);

impl Confidence {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::InvalidConfidence(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

//=========================================================================================
// Clause Findings
//=========================================================================================

/// A half-open `[start, end)` byte range into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSpan {
    start: usize,
    end: usize,
}

impl TextSpan {
    /// Builds a span, checking `start < end <= document_len`.
    pub fn new(start: usize, end: usize, document_len: usize) -> Result<Self, DomainError> {
        if start < end && end <= document_len {
            Ok(Self { start, end })
        } else {
            Err(DomainError::InvalidSpan {
                start,
                end,
                len: document_len,
            })
        }
    }

    /// Finds the first verbatim occurrence of `needle` (whitespace-trimmed) in `text`.
    pub fn locate(text: &str, needle: &str) -> Option<Self> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }
        text.find(needle).map(|start| Self {
            start,
            end: start + needle.len(),
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One detected clause within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseFinding {
    pub id: String,
    pub clause_type: String,
    pub content: String,
    pub risk_level: RiskLevel,
    pub confidence: Confidence,
    pub suggestions: Vec<String>,
    pub position: TextSpan,
}

impl ClauseFinding {
    pub fn new(
        id: impl Into<String>,
        clause_type: impl Into<String>,
        content: impl Into<String>,
        risk_level: RiskLevel,
        confidence: Confidence,
        suggestions: Vec<String>,
        position: TextSpan,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::EmptyClauseId);
        }
        Ok(Self {
            id,
            clause_type: clause_type.into(),
            content: content.into(),
            risk_level,
            confidence,
            suggestions,
            position,
        })
    }

    /// The slice of `text` covered by this finding, if the span fits it.
    pub fn excerpt<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.position.start()..self.position.end())
    }
}

/// What a clause extraction service returns for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseAnalysis {
    pub findings: Vec<ClauseFinding>,
    pub narrative: String,
}

/// A completed analysis as persisted for a document.
/// The risk summary is never stored; it is recomputed from `findings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAnalysis {
    pub document_id: Uuid,
    pub findings: Vec<ClauseFinding>,
    pub narrative: String,
    pub model: String,
    pub analyzed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

/// Document-level statistics derived from a set of clause findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRiskSummary {
    pub clause_count: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub average_confidence: u8,
    pub overall_risk_level: RiskLevel,
    pub overall_risk_score: u8,
}

//=========================================================================================
// Document Records and Lifecycle
//=========================================================================================

/// Where a document is in its analysis lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    /// Analysis was attempted and failed; the document may be re-analyzed.
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DocumentStatus::Pending),
            "processing" => Ok(DocumentStatus::Processing),
            "completed" => Ok(DocumentStatus::Completed),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category label derived from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Contract,
    Agreement,
    Document,
    Unknown,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => DocumentKind::Contract,
            Some("doc") | Some("docx") => DocumentKind::Agreement,
            Some("txt") => DocumentKind::Document,
            _ => DocumentKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Contract => "Contract",
            DocumentKind::Agreement => "Agreement",
            DocumentKind::Document => "Document",
            DocumentKind::Unknown => "Unknown",
        }
    }

    /// Parses the label produced by `as_str`; anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Contract" => DocumentKind::Contract,
            "Agreement" => DocumentKind::Agreement,
            "Document" => DocumentKind::Document,
            _ => DocumentKind::Unknown,
        }
    }
}

/// Metadata for one tracked document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub name: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    /// Mirrors the overall risk of the latest analysis once completed.
    pub risk_level: Option<RiskLevel>,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub collaborator_count: u32,
    pub blob_key: String,
    pub blob_url: String,
    pub failure_reason: Option<String>,
}

impl DocumentRecord {
    /// A freshly uploaded document, waiting for analysis.
    pub fn new_upload(name: impl Into<String>, blob: &StoredBlob) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            kind: DocumentKind::from_filename(&name),
            name,
            status: DocumentStatus::Pending,
            risk_level: None,
            uploaded_at: blob.uploaded_at,
            size_bytes: blob.size_bytes,
            collaborator_count: 1,
            blob_key: blob.key.clone(),
            blob_url: blob.url.clone(),
            failure_reason: None,
        }
    }

    /// `Pending | Failed -> Processing`.
    pub fn begin_analysis(&mut self) -> Result<(), DomainError> {
        match self.status {
            DocumentStatus::Pending | DocumentStatus::Failed => {
                self.status = DocumentStatus::Processing;
                self.failure_reason = None;
                Ok(())
            }
            from => Err(DomainError::InvalidTransition {
                from,
                action: "begin analysis of",
            }),
        }
    }

    /// `Processing -> Completed`, adopting the summary's overall risk.
    pub fn complete(&mut self, summary: &DocumentRiskSummary) -> Result<(), DomainError> {
        self.require_processing("complete")?;
        self.status = DocumentStatus::Completed;
        self.risk_level = Some(summary.overall_risk_level);
        Ok(())
    }

    /// `Processing -> Failed`. The risk level is left untouched.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.require_processing("fail")?;
        self.status = DocumentStatus::Failed;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    fn require_processing(&self, action: &'static str) -> Result<(), DomainError> {
        if self.status == DocumentStatus::Processing {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }
}

/// Renders a byte count the way the document list shows it: `1536 -> "1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

//=========================================================================================
// Collaboration
//=========================================================================================

/// A collaboration annotation, optionally pointing at a clause by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Weak reference to a `ClauseFinding::id`; may dangle.
    pub clause_id: Option<String>,
}

impl Comment {
    /// Builds a comment stamped with a fresh id and the current time.
    pub fn new(
        author: impl Into<String>,
        content: &str,
        clause_id: Option<String>,
    ) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyComment);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            author: author.into(),
            content: content.to_string(),
            created_at: Utc::now(),
            clause_id,
        })
    }

    /// Looks up the referenced clause. A dangling reference resolves to `None`.
    pub fn resolve_clause<'a>(&self, findings: &'a [ClauseFinding]) -> Option<&'a ClauseFinding> {
        let clause_id = self.clause_id.as_deref()?;
        findings.iter().find(|f| f.id == clause_id)
    }
}

//=========================================================================================
// Blob Storage
//=========================================================================================

/// What a blob store hands back after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DocumentRecord {
        let blob = StoredBlob {
            key: "a".to_string(),
            url: "http://blobs/a".to_string(),
            size_bytes: 2355,
            uploaded_at: Utc::now(),
        };
        DocumentRecord::new_upload("Service Agreement.pdf", &blob)
    }

    #[test]
    fn risk_level_parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("HIGH".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert_eq!(" medium ".parse::<RiskLevel>(), Ok(RiskLevel::Medium));
        assert!(matches!(
            "critical".parse::<RiskLevel>(),
            Err(DomainError::InvalidRiskLevel(_))
        ));
        assert!(RiskLevel::High > RiskLevel::Medium && RiskLevel::Medium > RiskLevel::Low);
    }

    #[test]
    fn confidence_bounds() {
        assert_eq!(Confidence::new(0).map(|c| c.get()), Ok(0));
        assert_eq!(Confidence::new(100).map(|c| c.get()), Ok(100));
        assert_eq!(Confidence::new(101), Err(DomainError::InvalidConfidence(101)));
        assert_eq!(Confidence::new(-1), Err(DomainError::InvalidConfidence(-1)));
    }

    #[test]
    fn text_span_requires_non_empty_in_bounds_range() {
        assert!(TextSpan::new(0, 10, 10).is_ok());
        assert!(TextSpan::new(5, 5, 10).is_err());
        assert!(TextSpan::new(4, 11, 10).is_err());
    }

    #[test]
    fn text_span_locates_trimmed_needle() {
        let text = "1. SERVICES\nProvider agrees to perform.";
        let span = TextSpan::locate(text, "  Provider agrees  ").unwrap();
        assert_eq!(&text[span.start()..span.end()], "Provider agrees");
        assert_eq!(TextSpan::locate(text, "missing"), None);
        assert_eq!(TextSpan::locate(text, "   "), None);
    }

    #[test]
    fn clause_finding_rejects_blank_id_and_excerpts_text() {
        let text = "Payment is due in 30 days.";
        let span = TextSpan::new(0, 7, text.len()).unwrap();
        let conf = Confidence::new(90).unwrap();
        assert_eq!(
            ClauseFinding::new(" ", "Payment Terms", "Payment", RiskLevel::Low, conf, vec![], span),
            Err(DomainError::EmptyClauseId)
        );
        let finding =
            ClauseFinding::new("c1", "Payment Terms", "Payment", RiskLevel::Low, conf, vec![], span)
                .unwrap();
        assert_eq!(finding.excerpt(text), Some("Payment"));
        assert_eq!(finding.excerpt("short"), None);
    }

    #[test]
    fn document_kind_from_extension() {
        assert_eq!(DocumentKind::from_filename("a.PDF"), DocumentKind::Contract);
        assert_eq!(DocumentKind::from_filename("a.docx"), DocumentKind::Agreement);
        assert_eq!(DocumentKind::from_filename("a.doc"), DocumentKind::Agreement);
        assert_eq!(DocumentKind::from_filename("notes.txt"), DocumentKind::Document);
        assert_eq!(DocumentKind::from_filename("README"), DocumentKind::Unknown);
        assert_eq!(DocumentKind::from_label("Agreement"), DocumentKind::Agreement);
    }

    #[test]
    fn lifecycle_happy_path_sets_risk_level() {
        let mut record = sample_record();
        assert_eq!(record.status, DocumentStatus::Pending);
        assert_eq!(record.kind, DocumentKind::Contract);
        assert_eq!(record.blob_key, "a");
        assert_eq!(record.size_bytes, 2355);
        record.begin_analysis().unwrap();
        assert_eq!(record.status, DocumentStatus::Processing);

        let summary = DocumentRiskSummary {
            clause_count: 1,
            high_risk_count: 1,
            medium_risk_count: 0,
            low_risk_count: 0,
            average_confidence: 90,
            overall_risk_level: RiskLevel::High,
            overall_risk_score: 100,
        };
        record.complete(&summary).unwrap();
        assert_eq!(record.status, DocumentStatus::Completed);
        assert_eq!(record.risk_level, Some(RiskLevel::High));
    }

    #[test]
    fn lifecycle_rejects_invalid_transitions() {
        let mut record = sample_record();
        assert!(record.fail("boom").is_err());

        record.begin_analysis().unwrap();
        assert!(matches!(
            record.begin_analysis(),
            Err(DomainError::InvalidTransition {
                from: DocumentStatus::Processing,
                ..
            })
        ));

        record.fail("upstream timeout").unwrap();
        assert_eq!(record.status, DocumentStatus::Failed);
        assert_eq!(record.risk_level, None);
        assert_eq!(record.failure_reason.as_deref(), Some("upstream timeout"));

        // Failed documents are retry-eligible.
        record.begin_analysis().unwrap();
        assert_eq!(record.failure_reason, None);
    }

    #[test]
    fn completed_documents_cannot_be_reanalyzed() {
        let mut record = sample_record();
        record.begin_analysis().unwrap();
        let summary = DocumentRiskSummary {
            clause_count: 0,
            high_risk_count: 0,
            medium_risk_count: 0,
            low_risk_count: 0,
            average_confidence: 0,
            overall_risk_level: RiskLevel::Low,
            overall_risk_score: 0,
        };
        record.complete(&summary).unwrap();
        assert!(record.begin_analysis().is_err());
    }

    #[test]
    fn file_sizes_render_like_the_document_list() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2355), "2.3 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn comment_requires_content_and_resolves_fail_open() {
        assert_eq!(Comment::new("You", "   \n", None), Err(DomainError::EmptyComment));

        let comment = Comment::new("You", "  Too broad. ", Some("clause-9".into())).unwrap();
        assert_eq!(comment.content, "Too broad.");
        assert!(comment.resolve_clause(&[]).is_none());
    }
}
