//! Shared harness for the api integration tests: an in-process router over
//! the in-memory store, a temp-dir blob store and swappable collaborators.

#![allow(dead_code)]

use api_lib::{
    adapters::{DemoClauseAdapter, FsBlobStore, InMemoryDocumentStore},
    config::Config,
    web::{router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use docureview_core::{
    domain::{
        ClauseAnalysis, Comment, DocumentAnalysis, DocumentRecord, DocumentStatus, StoredBlob,
    },
    ports::{
        BlobStore, ChatMessage, ClauseExtractionService, DocumentStore, LegalAssistantService,
        NewDocument, PortError, PortResult, TextStream,
    },
};
use http_body_util::BodyExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "docureview-test-boundary";

//=========================================================================================
// Stub Collaborators
//=========================================================================================

/// Always fails, as an unreachable LLM would.
pub struct FailingExtractor;

#[async_trait]
impl ClauseExtractionService for FailingExtractor {
    async fn extract_clauses(&self, _: &str, _: Option<&str>) -> PortResult<ClauseAnalysis> {
        Err(PortError::Unexpected("upstream returned 503".to_string()))
    }

    fn model_label(&self) -> String {
        "failing".to_string()
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowExtractor;

#[async_trait]
impl ClauseExtractionService for SlowExtractor {
    async fn extract_clauses(&self, _: &str, _: Option<&str>) -> PortResult<ClauseAnalysis> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ClauseAnalysis {
            findings: Vec::new(),
            narrative: String::new(),
        })
    }

    fn model_label(&self) -> String {
        "slow".to_string()
    }
}

/// Streams fixed chunks, then optionally an error.
pub struct ScriptedAssistant {
    pub chunks: Vec<&'static str>,
    pub fail_after: bool,
}

#[async_trait]
impl LegalAssistantService for ScriptedAssistant {
    async fn answer_streaming(
        &self,
        _messages: &[ChatMessage],
        _document_context: Option<&str>,
    ) -> PortResult<TextStream> {
        let mut items: Vec<PortResult<String>> =
            self.chunks.iter().map(|c| Ok(c.to_string())).collect();
        if self.fail_after {
            items.push(Err(PortError::Unexpected("connection reset".to_string())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Rejects every upload.
pub struct BrokenBlobStore;

#[async_trait]
impl BlobStore for BrokenBlobStore {
    async fn put(&self, _: &str, _: &[u8]) -> PortResult<StoredBlob> {
        Err(PortError::Unexpected("bucket unavailable".to_string()))
    }

    async fn get(&self, key: &str) -> PortResult<Vec<u8>> {
        Err(PortError::NotFound(key.to_string()))
    }
}

/// An in-memory store whose disk fills up just as an analysis completes.
#[derive(Default)]
pub struct CompletionRejectingStore {
    inner: InMemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for CompletionRejectingStore {
    async fn list_documents(&self) -> PortResult<Vec<DocumentRecord>> {
        self.inner.list_documents().await
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<DocumentRecord> {
        self.inner.get_document(document_id).await
    }

    async fn insert_document(&self, record: &DocumentRecord) -> PortResult<()> {
        self.inner.insert_document(record).await
    }

    async fn insert_documents(&self, uploads: &[NewDocument]) -> PortResult<()> {
        self.inner.insert_documents(uploads).await
    }

    async fn update_document(&self, record: &DocumentRecord) -> PortResult<()> {
        if record.status == DocumentStatus::Completed {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.inner.update_document(record).await
    }

    async fn update_document_if(
        &self,
        record: &DocumentRecord,
        expected: &[DocumentStatus],
    ) -> PortResult<bool> {
        self.inner.update_document_if(record, expected).await
    }

    async fn save_document_text(&self, document_id: Uuid, text: &str) -> PortResult<()> {
        self.inner.save_document_text(document_id, text).await
    }

    async fn get_document_text(&self, document_id: Uuid) -> PortResult<Option<String>> {
        self.inner.get_document_text(document_id).await
    }

    async fn save_analysis(&self, analysis: &DocumentAnalysis) -> PortResult<()> {
        self.inner.save_analysis(analysis).await
    }

    async fn get_analysis(&self, document_id: Uuid) -> PortResult<DocumentAnalysis> {
        self.inner.get_analysis(document_id).await
    }

    async fn append_comment(&self, document_id: Uuid, comment: &Comment) -> PortResult<()> {
        self.inner.append_comment(document_id, comment).await
    }

    async fn list_comments(&self, document_id: Uuid) -> PortResult<Vec<Comment>> {
        self.inner.list_comments(document_id).await
    }
}

//=========================================================================================
// App Construction
//=========================================================================================

pub fn test_config(blob_dir: PathBuf) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: None,
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        analysis_model: "test-model".to_string(),
        chat_model: "test-model".to_string(),
        demo_mode: true,
        blob_dir,
        public_base_url: "http://localhost:3000".to_string(),
        analysis_timeout: Duration::from_millis(200),
        max_upload_bytes: 64 * 1024,
        cors_origin: "http://localhost:3000".to_string(),
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

pub struct TestAppBuilder {
    extractor: Arc<dyn ClauseExtractionService>,
    assistant: Arc<dyn LegalAssistantService>,
    blobs: Option<Arc<dyn BlobStore>>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            extractor: Arc::new(DemoClauseAdapter::new()),
            assistant: Arc::new(ScriptedAssistant {
                chunks: vec!["Hello", " there"],
                fail_after: false,
            }),
            blobs: None,
            store: None,
        }
    }

    pub fn extractor(mut self, extractor: impl ClauseExtractionService + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn assistant(mut self, assistant: impl LegalAssistantService + 'static) -> Self {
        self.assistant = Arc::new(assistant);
        self
    }

    pub fn blobs(mut self, blobs: impl BlobStore + 'static) -> Self {
        self.blobs = Some(Arc::new(blobs));
        self
    }

    pub fn store(mut self, store: impl DocumentStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub async fn build(self) -> TestApp {
        let blob_dir = std::env::temp_dir().join(format!("docureview-it-{}", Uuid::new_v4()));
        let config = test_config(blob_dir.clone());
        let blobs: Arc<dyn BlobStore> = match self.blobs {
            Some(blobs) => blobs,
            None => Arc::new(
                FsBlobStore::new(blob_dir, &config.public_base_url)
                    .await
                    .unwrap(),
            ),
        };
        let store: Arc<dyn DocumentStore> = match self.store {
            Some(store) => store,
            None => Arc::new(InMemoryDocumentStore::new()),
        };
        let state = Arc::new(AppState {
            store,
            blobs,
            extractor: self.extractor,
            assistant: self.assistant,
            config: Arc::new(config),
        });
        TestApp {
            router: router(state.clone()),
            state,
        }
    }
}

//=========================================================================================
// Request Helpers
//=========================================================================================

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_empty(&self, uri: &str) -> Response<Body> {
        self.send(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Uploads `(filename, content_type, bytes)` parts under the `files` field.
    pub async fn upload(&self, files: &[(&str, &str, &[u8])]) -> Response<Body> {
        self.upload_as("files", files).await
    }

    /// Uploads parts under an arbitrary form field name.
    pub async fn upload_as(&self, field: &str, files: &[(&str, &str, &[u8])]) -> Response<Body> {
        self.send(
            Request::post("/documents")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(field, files)))
                .unwrap(),
        )
        .await
    }

    /// Uploads a single file and returns its new document id.
    pub async fn upload_one(&self, name: &str, content_type: &str, bytes: &[u8]) -> Uuid {
        let response = self.upload(&[(name, content_type, bytes)]).await;
        assert_eq!(response.status(), 201);
        let body = json_body(response).await;
        body["documents"][0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap()
    }

    /// Polls the document until it leaves `processing`, returning its JSON.
    pub async fn wait_for_analysis(&self, id: Uuid) -> serde_json::Value {
        for _ in 0..100 {
            let doc = json_body(self.get(&format!("/documents/{}", id)).await).await;
            if doc["status"] != "processing" {
                return doc;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("analysis of {} did not finish", id);
    }
}

pub fn multipart_body(field: &str, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, field, name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
