//! crates/docureview_core/src/aggregator.rs
//!
//! The risk aggregation rules: how per-clause findings roll up into a
//! document-level summary, and how the document list is searched and
//! filtered. Everything here is pure and never mutates its inputs.

use crate::domain::{
    ClauseFinding, Comment, DocumentRecord, DocumentRiskSummary, DocumentStatus, DomainError,
    RiskLevel,
};
use std::str::FromStr;

/// Rolls a set of findings up into a document-level summary.
///
/// The overall level is the worst level present, so one `High` clause among
/// any number of `Low` ones still makes the document `High`. The score is
/// `100 * (2*high + medium) / (2*count)`, rounded half up; an empty input
/// yields all zeros and `Low`.
pub fn summarize(findings: &[ClauseFinding]) -> DocumentRiskSummary {
    let mut high = 0usize;
    let mut medium = 0usize;
    let mut low = 0usize;
    let mut confidence_total = 0u64;

    for finding in findings {
        match finding.risk_level {
            RiskLevel::High => high += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::Low => low += 1,
        }
        confidence_total += u64::from(finding.confidence.get());
    }

    let count = findings.len();
    let overall_risk_level = findings
        .iter()
        .map(|f| f.risk_level)
        .max()
        .unwrap_or(RiskLevel::Low);

    let (average_confidence, overall_risk_score) = if count == 0 {
        (0, 0)
    } else {
        let n = count as u64;
        let weighted = 2 * high as u64 + medium as u64;
        (
            rounded_ratio(confidence_total, n),
            rounded_ratio(100 * weighted, 2 * n),
        )
    };

    DocumentRiskSummary {
        clause_count: count,
        high_risk_count: high,
        medium_risk_count: medium,
        low_risk_count: low,
        average_confidence,
        overall_risk_level,
        overall_risk_score,
    }
}

// Both callers keep the ratio within 0..=100.
fn rounded_ratio(numerator: u64, denominator: u64) -> u8 {
    ((2 * numerator + denominator) / (2 * denominator)) as u8
}

/// The status dimension of the document list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DocumentStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: DocumentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<DocumentStatus>()
            .map(StatusFilter::Only)
            .map_err(|_| DomainError::InvalidStatusFilter(s.to_string()))
    }
}

/// Returns the documents whose name contains `query` (case-insensitively)
/// and whose status passes `status`, in their original order.
pub fn filter_documents(
    docs: &[DocumentRecord],
    query: &str,
    status: StatusFilter,
) -> Vec<DocumentRecord> {
    let needle = query.to_lowercase();
    docs.iter()
        .filter(|doc| doc.name.to_lowercase().contains(&needle))
        .filter(|doc| status.matches(doc.status))
        .cloned()
        .collect()
}

/// Appends a new comment to the end of the thread.
///
/// Blank content is ignored and the thread comes back unchanged; use
/// [`Comment::new`] directly when the caller needs to report that case.
pub fn add_comment(
    comments: &[Comment],
    content: &str,
    author: &str,
    clause_id: Option<String>,
) -> Vec<Comment> {
    let mut thread = comments.to_vec();
    if let Ok(comment) = Comment::new(author, content, clause_id) {
        thread.push(comment);
    }
    thread
}
