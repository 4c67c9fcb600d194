//! services/api/src/adapters/clause_llm.rs
//!
//! This module contains the adapter for the clause-extraction LLM.
//! It implements the `ClauseExtractionService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert legal document analyzer.

Analyze the document you are given and identify its key clauses. For every clause, report:
- "id": a short identifier such as "clause-1", unique within this document
- "type": the clause category (e.g. "Termination", "Liability", "Payment Terms", "Confidentiality")
- "content": the clause text, copied VERBATIM from the document (do not paraphrase, do not fix typos)
- "riskLevel": exactly one of "low", "medium", "high"
- "confidence": an integer from 0 to 100 for how sure you are about the risk rating
- "suggestions": a list of short, concrete improvements (may be empty)

Also write a "summary": two or three sentences describing the document's overall risk.

Respond with ONLY a JSON object of the form:
{"clauses": [ ... ], "summary": "..."}"#;

const USER_INPUT_TEMPLATE: &str = r#"Analyze this {document_type}:

---
{text}
---"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use docureview_core::{
    domain::{ClauseAnalysis, ClauseFinding, Confidence, RiskLevel, TextSpan},
    ports::{ClauseExtractionService, PortError, PortResult},
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ClauseExtractionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiClauseAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClauseAdapter {
    /// Creates a new `OpenAiClauseAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// "Impure" Wire Structs
//=========================================================================================

#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    clauses: Vec<RawClause>,
    #[serde(default)]
    summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClause {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", alias = "clauseType")]
    clause_type: String,
    content: String,
    #[serde(alias = "risk_level", alias = "risk")]
    risk_level: String,
    confidence: f64,
    #[serde(default)]
    suggestions: Vec<String>,
}

impl RawClause {
    fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Validates the clause against the document it was extracted from.
    fn to_domain(self, id: String, text: &str) -> PortResult<ClauseFinding> {
        let risk_level = self
            .risk_level
            .parse::<RiskLevel>()
            .map_err(|e| PortError::Malformed(format!("{}: {}", id, e)))?;
        let confidence = Confidence::new(self.confidence.round() as i64)
            .map_err(|e| PortError::Malformed(format!("{}: {}", id, e)))?;
        let position = TextSpan::locate(text, &self.content).ok_or_else(|| {
            PortError::Malformed(format!("{}: clause content does not occur in the document", id))
        })?;

        ClauseFinding::new(
            id,
            self.clause_type,
            self.content.trim(),
            risk_level,
            confidence,
            self.suggestions,
            position,
        )
        .map_err(|e| PortError::Malformed(e.to_string()))
    }
}

/// Turns the model's raw reply into a validated analysis of `text`.
///
/// Markdown code fences around the JSON are tolerated. Any clause that fails
/// validation rejects the whole reply, as does an id the model repeats.
/// Clauses without an id get `clause-N`, skipping ids already in use.
pub fn parse_clause_response(raw: &str, text: &str) -> PortResult<ClauseAnalysis> {
    let fence = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$")
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let json = match fence.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    };

    let parsed: RawAnalysis =
        serde_json::from_str(json).map_err(|e| PortError::Malformed(e.to_string()))?;

    let mut taken = HashSet::new();
    for clause in &parsed.clauses {
        if let Some(id) = clause.explicit_id() {
            if !taken.insert(id.to_string()) {
                return Err(PortError::Malformed(format!("duplicate clause id '{}'", id)));
            }
        }
    }

    let mut findings = Vec::with_capacity(parsed.clauses.len());
    for (index, clause) in parsed.clauses.into_iter().enumerate() {
        let id = match clause.explicit_id() {
            Some(id) => id.to_string(),
            None => {
                let mut n = index + 1;
                while taken.contains(&format!("clause-{}", n)) {
                    n += 1;
                }
                let id = format!("clause-{}", n);
                taken.insert(id.clone());
                id
            }
        };
        findings.push(clause.to_domain(id, text)?);
    }

    Ok(ClauseAnalysis {
        findings,
        narrative: parsed.summary.trim().to_string(),
    })
}

//=========================================================================================
// `ClauseExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ClauseExtractionService for OpenAiClauseAdapter {
    async fn extract_clauses(
        &self,
        text: &str,
        document_type: Option<&str>,
    ) -> PortResult<ClauseAnalysis> {
        let user_input = USER_INPUT_TEMPLATE
            .replace("{document_type}", document_type.unwrap_or("legal document"))
            .replace("{text}", text);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_input)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.0_f32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Malformed("Clause extraction LLM returned no text content.".to_string())
            })?;

        match parse_clause_response(&content, text) {
            Ok(analysis) => {
                info!("LLM extracted {} clauses", analysis.findings.len());
                Ok(analysis)
            }
            Err(e) => {
                warn!("Rejected clause extraction response: {}", e);
                Err(e)
            }
        }
    }

    fn model_label(&self) -> String {
        self.model.clone()
    }
}
