pub mod aggregator;
pub mod domain;
pub mod fixtures;
pub mod ports;

pub use aggregator::{add_comment, filter_documents, summarize, StatusFilter};
pub use domain::{
    format_file_size, ClauseAnalysis, ClauseFinding, Comment, Confidence, DocumentAnalysis,
    DocumentKind, DocumentRecord, DocumentRiskSummary, DocumentStatus, DomainError, RiskLevel,
    StoredBlob, TextSpan,
};
pub use ports::{
    BlobStore, ChatMessage, ChatRole, ClauseExtractionService, DocumentStore,
    LegalAssistantService, PortError, PortResult, TextStream,
};
