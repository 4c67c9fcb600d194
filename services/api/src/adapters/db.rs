//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docureview_core::domain::{
    ClauseFinding, Comment, Confidence, DocumentAnalysis, DocumentKind, DocumentRecord,
    DocumentStatus, RiskLevel, TextSpan,
};
use docureview_core::ports::{DocumentStore, NewDocument, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgArguments, query::Query, types::Json, FromRow, PgPool, Postgres};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("Stored {} is corrupt: {}", what, detail))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const DOCUMENT_COLUMNS: &str = "id, name, kind, status, risk_level, uploaded_at, size_bytes, \
     collaborator_count, blob_key, blob_url, failure_reason";

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    name: String,
    kind: String,
    status: String,
    risk_level: Option<String>,
    uploaded_at: DateTime<Utc>,
    size_bytes: i64,
    collaborator_count: i32,
    blob_key: String,
    blob_url: String,
    failure_reason: Option<String>,
}

impl DocumentRow {
    fn to_domain(self) -> PortResult<DocumentRecord> {
        let status = self
            .status
            .parse::<DocumentStatus>()
            .map_err(|e| corrupt("document", e))?;
        let risk_level = self
            .risk_level
            .map(|level| level.parse::<RiskLevel>())
            .transpose()
            .map_err(|e| corrupt("document", e))?;
        Ok(DocumentRecord {
            id: self.id,
            name: self.name,
            kind: DocumentKind::from_label(&self.kind),
            status,
            risk_level,
            uploaded_at: self.uploaded_at,
            size_bytes: self.size_bytes.max(0) as u64,
            collaborator_count: self.collaborator_count.max(0) as u32,
            blob_key: self.blob_key,
            blob_url: self.blob_url,
            failure_reason: self.failure_reason,
        })
    }
}

/// A finding as it is kept inside the `analyses.findings` JSONB column.
#[derive(Serialize, Deserialize)]
struct FindingRecord {
    id: String,
    clause_type: String,
    content: String,
    risk_level: String,
    confidence: u8,
    suggestions: Vec<String>,
    start: usize,
    end: usize,
}

impl FindingRecord {
    fn from_domain(finding: &ClauseFinding) -> Self {
        Self {
            id: finding.id.clone(),
            clause_type: finding.clause_type.clone(),
            content: finding.content.clone(),
            risk_level: finding.risk_level.as_str().to_string(),
            confidence: finding.confidence.get(),
            suggestions: finding.suggestions.clone(),
            start: finding.position.start(),
            end: finding.position.end(),
        }
    }

    fn to_domain(self) -> PortResult<ClauseFinding> {
        let risk_level = self
            .risk_level
            .parse::<RiskLevel>()
            .map_err(|e| corrupt("finding", e))?;
        let confidence =
            Confidence::new(i64::from(self.confidence)).map_err(|e| corrupt("finding", e))?;
        // The span was validated against the text when the analysis was made.
        let position =
            TextSpan::new(self.start, self.end, self.end).map_err(|e| corrupt("finding", e))?;
        ClauseFinding::new(
            self.id,
            self.clause_type,
            self.content,
            risk_level,
            confidence,
            self.suggestions,
            position,
        )
        .map_err(|e| corrupt("finding", e))
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    document_id: Uuid,
    findings: Json<Vec<FindingRecord>>,
    narrative: String,
    model: String,
    analyzed_at: DateTime<Utc>,
    processing_time_ms: i64,
}

impl AnalysisRow {
    fn to_domain(self) -> PortResult<DocumentAnalysis> {
        let findings = self
            .findings
            .0
            .into_iter()
            .map(FindingRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(DocumentAnalysis {
            document_id: self.document_id,
            findings,
            narrative: self.narrative,
            model: self.model,
            analyzed_at: self.analyzed_at,
            processing_time_ms: self.processing_time_ms.max(0) as u64,
        })
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    author: String,
    content: String,
    clause_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            author: self.author,
            content: self.content,
            created_at: self.created_at,
            clause_id: self.clause_id,
        }
    }
}

//=========================================================================================
// Shared Statements
//=========================================================================================

const INSERT_DOCUMENT: &str = "INSERT INTO documents (id, name, kind, status, risk_level, \
     uploaded_at, size_bytes, collaborator_count, blob_key, blob_url, failure_reason, \
     extracted_text) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

const UPDATE_DOCUMENT: &str = "UPDATE documents SET name = $2, kind = $3, status = $4, \
     risk_level = $5, size_bytes = $6, collaborator_count = $7, blob_key = $8, blob_url = $9, \
     failure_reason = $10 WHERE id = $1";

fn insert_query<'q>(
    record: &'q DocumentRecord,
    text: Option<&'q str>,
) -> Query<'q, Postgres, PgArguments> {
    sqlx::query(INSERT_DOCUMENT)
        .bind(record.id)
        .bind(&record.name)
        .bind(record.kind.as_str())
        .bind(record.status.as_str())
        .bind(record.risk_level.map(|level| level.as_str()))
        .bind(record.uploaded_at)
        .bind(record.size_bytes as i64)
        .bind(record.collaborator_count as i32)
        .bind(&record.blob_key)
        .bind(&record.blob_url)
        .bind(&record.failure_reason)
        .bind(text)
}

fn update_query<'q>(sql: &'q str, record: &'q DocumentRecord) -> Query<'q, Postgres, PgArguments> {
    sqlx::query(sql)
        .bind(record.id)
        .bind(&record.name)
        .bind(record.kind.as_str())
        .bind(record.status.as_str())
        .bind(record.risk_level.map(|level| level.as_str()))
        .bind(record.size_bytes as i64)
        .bind(record.collaborator_count as i32)
        .bind(&record.blob_key)
        .bind(&record.blob_url)
        .bind(&record.failure_reason)
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

impl PgDocumentStore {
    /// Fails with `NotFound` unless the document row exists.
    async fn ensure_document(&self, document_id: Uuid) -> PortResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM documents WHERE id = $1)")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;
        if exists {
            Ok(())
        } else {
            Err(PortError::NotFound(format!("Document {} not found", document_id)))
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn list_documents(&self) -> PortResult<Vec<DocumentRecord>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM documents ORDER BY uploaded_at ASC, id ASC",
            DOCUMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows.into_iter().map(DocumentRow::to_domain).collect()
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<DocumentRecord> {
        let row: DocumentRow = sqlx::query_as(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => unexpected(e),
        })?;
        row.to_domain()
    }

    async fn insert_document(&self, record: &DocumentRecord) -> PortResult<()> {
        insert_query(record, None)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_documents(&self, uploads: &[NewDocument]) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        for upload in uploads {
            insert_query(&upload.record, upload.text.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)
    }

    async fn update_document(&self, record: &DocumentRecord) -> PortResult<()> {
        let result = update_query(UPDATE_DOCUMENT, record)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {} not found", record.id)));
        }
        Ok(())
    }

    async fn update_document_if(
        &self,
        record: &DocumentRecord,
        expected: &[DocumentStatus],
    ) -> PortResult<bool> {
        let sql = format!("{} AND status = ANY($11)", UPDATE_DOCUMENT);
        let statuses: Vec<String> = expected.iter().map(|s| s.as_str().to_string()).collect();
        let result = update_query(&sql, record)
            .bind(statuses)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            self.ensure_document(record.id).await?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn save_document_text(&self, document_id: Uuid, text: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE documents SET extracted_text = $2 WHERE id = $1")
            .bind(document_id)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {} not found", document_id)));
        }
        Ok(())
    }

    async fn get_document_text(&self, document_id: Uuid) -> PortResult<Option<String>> {
        let text: Option<Option<String>> =
            sqlx::query_scalar("SELECT extracted_text FROM documents WHERE id = $1")
                .bind(document_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;

        text.ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))
    }

    async fn save_analysis(&self, analysis: &DocumentAnalysis) -> PortResult<()> {
        self.ensure_document(analysis.document_id).await?;

        let findings: Vec<FindingRecord> = analysis
            .findings
            .iter()
            .map(FindingRecord::from_domain)
            .collect();

        sqlx::query(
            "INSERT INTO analyses (document_id, findings, narrative, model, analyzed_at, processing_time_ms) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (document_id) DO UPDATE SET findings = EXCLUDED.findings, \
             narrative = EXCLUDED.narrative, model = EXCLUDED.model, \
             analyzed_at = EXCLUDED.analyzed_at, processing_time_ms = EXCLUDED.processing_time_ms",
        )
        .bind(analysis.document_id)
        .bind(Json(findings))
        .bind(&analysis.narrative)
        .bind(&analysis.model)
        .bind(analysis.analyzed_at)
        .bind(analysis.processing_time_ms as i64)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_analysis(&self, document_id: Uuid) -> PortResult<DocumentAnalysis> {
        let row: AnalysisRow = sqlx::query_as(
            "SELECT document_id, findings, narrative, model, analyzed_at, processing_time_ms \
             FROM analyses WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("No analysis for document {}", document_id))
            }
            _ => unexpected(e),
        })?;
        row.to_domain()
    }

    async fn append_comment(&self, document_id: Uuid, comment: &Comment) -> PortResult<()> {
        self.ensure_document(document_id).await?;

        sqlx::query(
            "INSERT INTO comments (id, document_id, author, content, clause_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(comment.id)
        .bind(document_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(&comment.clause_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_comments(&self, document_id: Uuid) -> PortResult<Vec<Comment>> {
        self.ensure_document(document_id).await?;

        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, author, content, clause_id, created_at FROM comments \
             WHERE document_id = $1 ORDER BY seq ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows.into_iter().map(CommentRow::to_domain).collect())
    }
}
