//! crates/docureview_core/src/fixtures.rs
//!
//! Sample data for demo mode and tests. Production paths never read from
//! here; the api only wires these in through its demo clause extractor.

use crate::domain::{
    ClauseFinding, Comment, Confidence, DocumentKind, DocumentRecord, DocumentStatus, RiskLevel,
    TextSpan,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// The sample service agreement used throughout the demo.
pub const SAMPLE_AGREEMENT: &str = r#"SERVICE AGREEMENT

This Service Agreement ("Agreement") is entered into on [DATE] between [CLIENT NAME] ("Client") and [SERVICE PROVIDER NAME] ("Provider").

1. SERVICES
Provider agrees to perform the services described in Exhibit A attached hereto and incorporated by reference ("Services").

2. PAYMENT TERMS
Payment shall be due within thirty (30) days of invoice date. Late payments may incur interest charges at the rate of 1.5% per month.

3. TERM AND TERMINATION
This Agreement shall commence on [START DATE] and continue until [END DATE], unless terminated earlier in accordance with this Agreement.

Either party may terminate this Agreement at any time with or without cause by providing thirty (30) days written notice to the other party.

4. LIABILITY
In no event shall either party be liable for any indirect, incidental, special, or consequential damages, regardless of the form of action.

5. CONFIDENTIALITY
Each party acknowledges that it may have access to confidential information of the other party.
"#;

pub const SAMPLE_NARRATIVE: &str = "Document contains some high-risk clauses that require attention, \
particularly around termination conditions and liability limitations.";

struct SampleClause {
    id: &'static str,
    clause_type: &'static str,
    content: &'static str,
    risk_level: RiskLevel,
    confidence: i64,
    suggestions: &'static [&'static str],
}

const SAMPLE_CLAUSES: [SampleClause; 3] = [
    SampleClause {
        id: "clause-1",
        clause_type: "Termination",
        content: "Either party may terminate this Agreement at any time with or without cause by providing thirty (30) days written notice to the other party.",
        risk_level: RiskLevel::High,
        confidence: 92,
        suggestions: &[
            "Add specific termination conditions",
            "Include termination fee structure",
            "Define notice delivery method",
        ],
    },
    SampleClause {
        id: "clause-2",
        clause_type: "Liability",
        content: "In no event shall either party be liable for any indirect, incidental, special, or consequential damages, regardless of the form of action.",
        risk_level: RiskLevel::Medium,
        confidence: 88,
        suggestions: &[
            "Add liability cap amount",
            "Specify excluded damage types",
            "Include carve-outs for willful misconduct",
        ],
    },
    SampleClause {
        id: "clause-3",
        clause_type: "Payment Terms",
        content: "Payment shall be due within thirty (30) days of invoice date. Late payments may incur interest charges at the rate of 1.5% per month.",
        risk_level: RiskLevel::Low,
        confidence: 95,
        suggestions: &["Consider shorter payment terms", "Add early payment discount"],
    },
];

/// The sample clauses that occur verbatim in `text`, with spans into it.
/// Clauses missing from `text` are left out.
pub fn sample_findings_for(text: &str) -> Vec<ClauseFinding> {
    SAMPLE_CLAUSES
        .iter()
        .filter_map(|clause| {
            let position = TextSpan::locate(text, clause.content)?;
            let confidence = Confidence::new(clause.confidence).ok()?;
            ClauseFinding::new(
                clause.id,
                clause.clause_type,
                clause.content,
                clause.risk_level,
                confidence,
                clause.suggestions.iter().map(|s| s.to_string()).collect(),
                position,
            )
            .ok()
        })
        .collect()
}

/// The three findings of the sample agreement.
pub fn sample_findings() -> Vec<ClauseFinding> {
    sample_findings_for(SAMPLE_AGREEMENT)
}

/// Four documents covering every non-failed status.
pub fn sample_documents() -> Vec<DocumentRecord> {
    let now = Utc::now();
    let doc = |name: &str,
               kind: DocumentKind,
               status: DocumentStatus,
               risk_level: Option<RiskLevel>,
               age: Duration,
               size_bytes: u64,
               collaborator_count: u32| DocumentRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        kind,
        status,
        risk_level,
        uploaded_at: now - age,
        size_bytes,
        collaborator_count,
        blob_key: name.to_string(),
        blob_url: format!("fixture://{}", name),
        failure_reason: None,
    };

    vec![
        doc(
            "Service Agreement.pdf",
            DocumentKind::Contract,
            DocumentStatus::Completed,
            Some(RiskLevel::Medium),
            Duration::hours(2),
            2355,
            4,
        ),
        doc(
            "Non-Disclosure Agreement.docx",
            DocumentKind::Agreement,
            DocumentStatus::Completed,
            Some(RiskLevel::Low),
            Duration::days(1),
            1843,
            2,
        ),
        doc(
            "Office Lease Agreement.pdf",
            DocumentKind::Contract,
            DocumentStatus::Processing,
            None,
            Duration::hours(3),
            4301,
            6,
        ),
        doc(
            "Employment Contract Template.doc",
            DocumentKind::Agreement,
            DocumentStatus::Pending,
            None,
            Duration::hours(5),
            3174,
            1,
        ),
    ]
}

/// Two reviewer comments on the sample agreement's first two clauses.
pub fn sample_comments() -> Vec<Comment> {
    let now = Utc::now();
    vec![
        Comment {
            id: Uuid::new_v4(),
            author: "Sarah Chen".to_string(),
            content: "This termination clause seems too broad. We should add specific conditions."
                .to_string(),
            created_at: now - Duration::hours(2),
            clause_id: Some("clause-1".to_string()),
        },
        Comment {
            id: Uuid::new_v4(),
            author: "Mike Johnson".to_string(),
            content: "Agreed. The liability cap should be higher given the project scope."
                .to_string(),
            created_at: now - Duration::hours(1),
            clause_id: Some("clause-2".to_string()),
        },
    ]
}
