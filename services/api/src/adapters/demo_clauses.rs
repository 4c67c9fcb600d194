//! services/api/src/adapters/demo_clauses.rs
//!
//! A `ClauseExtractionService` that never leaves the process: it reports the
//! sample clauses that occur in the document. Only wired in when `DEMO_MODE`
//! is set.

use async_trait::async_trait;
use docureview_core::{
    domain::ClauseAnalysis,
    fixtures,
    ports::{ClauseExtractionService, PortResult},
};

#[derive(Clone, Default)]
pub struct DemoClauseAdapter;

impl DemoClauseAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClauseExtractionService for DemoClauseAdapter {
    async fn extract_clauses(
        &self,
        text: &str,
        _document_type: Option<&str>,
    ) -> PortResult<ClauseAnalysis> {
        let findings = fixtures::sample_findings_for(text);
        let narrative = if findings.is_empty() {
            "No known clauses were recognized in this document.".to_string()
        } else {
            fixtures::SAMPLE_NARRATIVE.to_string()
        };
        Ok(ClauseAnalysis {
            findings,
            narrative,
        })
    }

    fn model_label(&self) -> String {
        "demo-fixtures".to_string()
    }
}
