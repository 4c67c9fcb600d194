//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DemoClauseAdapter, FsBlobStore, InMemoryDocumentStore, OpenAiAssistantAdapter,
        OpenAiClauseAdapter, PgDocumentStore,
    },
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use docureview_core::{
    domain::DocumentRecord,
    fixtures,
    ports::{
        BlobStore, ChatMessage, ClauseExtractionService, DocumentStore, LegalAssistantService,
        NewDocument, PortError, PortResult, TextStream,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Stands in for the chat assistant when no API key is configured.
struct OfflineAssistant;

#[async_trait]
impl LegalAssistantService for OfflineAssistant {
    async fn answer_streaming(
        &self,
        _messages: &[ChatMessage],
        _document_context: Option<&str>,
    ) -> PortResult<TextStream> {
        Err(PortError::Unexpected(
            "The legal assistant needs OPENAI_API_KEY to be configured".to_string(),
        ))
    }
}

/// Puts the sample agreement and its comments into an empty store.
async fn seed_demo_documents(
    store: &dyn DocumentStore,
    blobs: &dyn BlobStore,
) -> PortResult<()> {
    if !store.list_documents().await?.is_empty() {
        return Ok(());
    }
    let blob = blobs
        .put("Service Agreement.txt", fixtures::SAMPLE_AGREEMENT.as_bytes())
        .await?;
    let record = DocumentRecord::new_upload("Service Agreement.txt", &blob);
    store
        .insert_documents(&[NewDocument {
            record: record.clone(),
            text: Some(fixtures::SAMPLE_AGREEMENT.to_string()),
        }])
        .await?;
    for comment in fixtures::sample_comments() {
        store.append_comment(record.id, &comment).await?;
    }
    info!("Seeded demo document {}", record.id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Document Store ---
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_store = PgDocumentStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL is not set; documents are kept in memory only.");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let blobs: Arc<dyn BlobStore> =
        Arc::new(FsBlobStore::new(&config.blob_dir, &config.public_base_url).await?);

    // --- 3. Initialize Service Adapters ---
    let openai_client = config
        .openai_api_key
        .as_ref()
        .map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));

    let extractor: Arc<dyn ClauseExtractionService> = match (&openai_client, config.demo_mode) {
        (Some(client), false) => Arc::new(OpenAiClauseAdapter::new(
            client.clone(),
            config.analysis_model.clone(),
        )),
        _ => {
            info!("DEMO_MODE: clause analysis uses the built-in sample findings.");
            Arc::new(DemoClauseAdapter::new())
        }
    };
    let assistant: Arc<dyn LegalAssistantService> = match &openai_client {
        Some(client) => Arc::new(OpenAiAssistantAdapter::new(
            client.clone(),
            config.chat_model.clone(),
        )),
        None => {
            warn!("No OPENAI_API_KEY; the chat endpoint will report errors.");
            Arc::new(OfflineAssistant)
        }
    };

    if config.demo_mode {
        seed_demo_documents(store.as_ref(), blobs.as_ref()).await?;
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        blobs,
        extractor,
        assistant,
        config: config.clone(),
    });

    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let app = router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
