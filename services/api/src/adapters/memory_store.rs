//! services/api/src/adapters/memory_store.rs
//!
//! A `DocumentStore` that keeps everything in process memory. Used when no
//! `DATABASE_URL` is configured, and by the route tests.

use async_trait::async_trait;
use docureview_core::{
    domain::{Comment, DocumentAnalysis, DocumentRecord, DocumentStatus},
    ports::{DocumentStore, NewDocument, PortError, PortResult},
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    /// Insertion order is upload order.
    documents: Vec<DocumentRecord>,
    texts: HashMap<Uuid, String>,
    analyses: HashMap<Uuid, DocumentAnalysis>,
    comments: HashMap<Uuid, Vec<Comment>>,
}

impl MemoryState {
    fn position(&self, document_id: Uuid) -> PortResult<usize> {
        self.documents
            .iter()
            .position(|d| d.id == document_id)
            .ok_or_else(|| not_found(document_id))
    }
}

fn not_found(document_id: Uuid) -> PortError {
    PortError::NotFound(format!("Document {} not found", document_id))
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<MemoryState>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_documents(&self) -> PortResult<Vec<DocumentRecord>> {
        Ok(self.state.read().await.documents.clone())
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<DocumentRecord> {
        let state = self.state.read().await;
        let index = state.position(document_id)?;
        Ok(state.documents[index].clone())
    }

    async fn insert_document(&self, record: &DocumentRecord) -> PortResult<()> {
        let mut state = self.state.write().await;
        if state.position(record.id).is_ok() {
            return Err(PortError::Unexpected(format!(
                "Document {} already exists",
                record.id
            )));
        }
        state.documents.push(record.clone());
        Ok(())
    }

    async fn insert_documents(&self, uploads: &[NewDocument]) -> PortResult<()> {
        let mut state = self.state.write().await;
        for (i, upload) in uploads.iter().enumerate() {
            let id = upload.record.id;
            if state.position(id).is_ok() || uploads[..i].iter().any(|u| u.record.id == id) {
                return Err(PortError::Unexpected(format!("Document {} already exists", id)));
            }
        }
        for upload in uploads {
            state.documents.push(upload.record.clone());
            if let Some(text) = &upload.text {
                state.texts.insert(upload.record.id, text.clone());
            }
        }
        Ok(())
    }

    async fn update_document(&self, record: &DocumentRecord) -> PortResult<()> {
        let mut state = self.state.write().await;
        let index = state.position(record.id)?;
        state.documents[index] = record.clone();
        Ok(())
    }

    async fn update_document_if(
        &self,
        record: &DocumentRecord,
        expected: &[DocumentStatus],
    ) -> PortResult<bool> {
        let mut state = self.state.write().await;
        let index = state.position(record.id)?;
        if !expected.contains(&state.documents[index].status) {
            return Ok(false);
        }
        state.documents[index] = record.clone();
        Ok(true)
    }

    async fn save_document_text(&self, document_id: Uuid, text: &str) -> PortResult<()> {
        let mut state = self.state.write().await;
        state.position(document_id)?;
        state.texts.insert(document_id, text.to_string());
        Ok(())
    }

    async fn get_document_text(&self, document_id: Uuid) -> PortResult<Option<String>> {
        let state = self.state.read().await;
        state.position(document_id)?;
        Ok(state.texts.get(&document_id).cloned())
    }

    async fn save_analysis(&self, analysis: &DocumentAnalysis) -> PortResult<()> {
        let mut state = self.state.write().await;
        state.position(analysis.document_id)?;
        state
            .analyses
            .insert(analysis.document_id, analysis.clone());
        Ok(())
    }

    async fn get_analysis(&self, document_id: Uuid) -> PortResult<DocumentAnalysis> {
        self.state
            .read()
            .await
            .analyses
            .get(&document_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("No analysis for document {}", document_id))
            })
    }

    async fn append_comment(&self, document_id: Uuid, comment: &Comment) -> PortResult<()> {
        let mut state = self.state.write().await;
        state.position(document_id)?;
        state
            .comments
            .entry(document_id)
            .or_default()
            .push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, document_id: Uuid) -> PortResult<Vec<Comment>> {
        let state = self.state.read().await;
        state.position(document_id)?;
        Ok(state.comments.get(&document_id).cloned().unwrap_or_default())
    }
}
