pub mod assistant_llm;
pub mod blob_fs;
pub mod clause_llm;
pub mod db;
pub mod demo_clauses;
pub mod memory_store;

pub use assistant_llm::OpenAiAssistantAdapter;
pub use blob_fs::FsBlobStore;
pub use clause_llm::OpenAiClauseAdapter;
pub use db::PgDocumentStore;
pub use demo_clauses::DemoClauseAdapter;
pub use memory_store::InMemoryDocumentStore;
