//! crates/docureview_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{
    ClauseAnalysis, Comment, DocumentAnalysis, DocumentRecord, DocumentStatus, StoredBlob,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The collaborator answered, but with data that does not fit the domain.
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Timed out after {0} seconds")]
    Timeout(u64),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A boxed stream of text chunks, as produced by streaming LLM calls.
pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

/// A freshly uploaded record together with the text extracted from it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub record: DocumentRecord,
    pub text: Option<String>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for document records, their text, analyses and comments.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Document Records ---
    /// All records, oldest upload first.
    async fn list_documents(&self) -> PortResult<Vec<DocumentRecord>>;

    async fn get_document(&self, document_id: Uuid) -> PortResult<DocumentRecord>;

    async fn insert_document(&self, record: &DocumentRecord) -> PortResult<()>;

    /// Inserts a batch of uploads and their text. Either all of them are
    /// stored or none is.
    async fn insert_documents(&self, uploads: &[NewDocument]) -> PortResult<()>;

    /// Overwrites the stored record with the same id.
    async fn update_document(&self, record: &DocumentRecord) -> PortResult<()>;

    /// Overwrites the stored record only while its current status is one of
    /// `expected`. Returns `false`, writing nothing, when it is not.
    async fn update_document_if(
        &self,
        record: &DocumentRecord,
        expected: &[DocumentStatus],
    ) -> PortResult<bool>;

    // --- Extracted Text ---
    async fn save_document_text(&self, document_id: Uuid, text: &str) -> PortResult<()>;

    /// `Ok(None)` when no text was extracted at upload time.
    async fn get_document_text(&self, document_id: Uuid) -> PortResult<Option<String>>;

    // --- Analyses ---
    /// Replaces any earlier analysis of the same document.
    async fn save_analysis(&self, analysis: &DocumentAnalysis) -> PortResult<()>;

    async fn get_analysis(&self, document_id: Uuid) -> PortResult<DocumentAnalysis>;

    // --- Comments ---
    async fn append_comment(&self, document_id: Uuid, comment: &Comment) -> PortResult<()>;

    /// Comments in insertion order.
    async fn list_comments(&self, document_id: Uuid) -> PortResult<Vec<Comment>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes durably and returns where they can be fetched.
    async fn put(&self, filename: &str, bytes: &[u8]) -> PortResult<StoredBlob>;

    /// Fetches bytes previously stored under `key`.
    async fn get(&self, key: &str) -> PortResult<Vec<u8>>;
}

#[async_trait]
pub trait ClauseExtractionService: Send + Sync {
    /// Detects clauses in `text` and rates their risk.
    async fn extract_clauses(
        &self,
        text: &str,
        document_type: Option<&str>,
    ) -> PortResult<ClauseAnalysis>;

    /// A label identifying what produced the analysis (e.g. the model name).
    fn model_label(&self) -> String;
}

/// Who said a message in a chat with the legal assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[async_trait]
pub trait LegalAssistantService: Send + Sync {
    /// Streams an answer to the conversation, grounded in the optional document context.
    async fn answer_streaming(
        &self,
        messages: &[ChatMessage],
        document_context: Option<&str>,
    ) -> PortResult<TextStream>;
}
