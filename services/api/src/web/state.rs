//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use docureview_core::ports::{
    BlobStore, ClauseExtractionService, DocumentStore, LegalAssistantService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests and Analysis Tasks)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn ClauseExtractionService>,
    pub assistant: Arc<dyn LegalAssistantService>,
    pub config: Arc<Config>,
}
