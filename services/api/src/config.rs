//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When absent, documents live in an in-memory store for the process lifetime.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub analysis_model: String,
    pub chat_model: String,
    /// Serve canned sample analyses instead of calling the LLM.
    pub demo_mode: bool,
    pub blob_dir: PathBuf,
    pub public_base_url: String,
    pub analysis_timeout: Duration,
    pub max_upload_bytes: usize,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Storage Settings ---
        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let blob_dir = std::env::var("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./blobs"));
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let max_upload_bytes: usize = parse_var("MAX_UPLOAD_BYTES", "10485760")?;
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty());

        // --- Load Analysis Settings ---
        let analysis_model =
            std::env::var("ANALYSIS_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let demo_mode: bool = parse_var("DEMO_MODE", "false")?;
        let timeout_secs: u64 = parse_var("ANALYSIS_TIMEOUT_SECS", "60")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "ANALYSIS_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        if openai_api_key.is_none() && !demo_mode {
            return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            analysis_model,
            chat_model,
            demo_mode,
            blob_dir,
            public_base_url,
            analysis_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
            cors_origin,
        })
    }
}

/// Reads `name` (or `default` when unset) and parses it.
fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
