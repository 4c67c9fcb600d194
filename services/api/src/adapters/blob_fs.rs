//! services/api/src/adapters/blob_fs.rs
//!
//! A `BlobStore` backed by a local directory. Blobs are served back by the
//! api itself under `/blobs/{key}`, so the returned URL is stable for as
//! long as the directory is.

use async_trait::async_trait;
use chrono::Utc;
use docureview_core::{
    domain::StoredBlob,
    ports::{BlobStore, PortError, PortResult},
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Creates the store, making sure `root` exists.
    pub async fn new(root: impl Into<PathBuf>, public_base_url: &str) -> std::io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!("Blob store rooted at {}", root.display());
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are generated by `put`; anything that could escape the root is rejected.
    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(PortError::NotFound(format!("Blob {} not found", key)));
        }
        Ok(self.root.join(key))
    }
}

/// Maps a filename onto `[A-Za-z0-9._-]`, the way document ids are slugged.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> PortResult<StoredBlob> {
        let key = format!("{}-{}", Uuid::new_v4(), sanitize_filename(filename));
        let path = self.path_for(&key)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write blob {}: {}", key, e)))?;

        Ok(StoredBlob {
            url: format!("{}/blobs/{}", self.public_base_url, key),
            key,
            size_bytes: bytes.len() as u64,
            uploaded_at: Utc::now(),
        })
    }

    async fn get(&self, key: &str) -> PortResult<Vec<u8>> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PortError::NotFound(format!("Blob {} not found", key)),
            _ => PortError::Unexpected(format!("Failed to read blob {}: {}", key, e)),
        })
    }
}
