//! Storage port for uploaded files.
//!
//! The upload pipeline only ever sees `Arc<dyn FileStore>`; the backend
//! (`LocalFileStore` or `S3FileStore`) is picked at startup from `StorageConfig`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

pub mod local;
pub mod s3;

pub use local::LocalFileStore;
pub use s3::S3FileStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("{0}")]
    Backend(String),
}

/// Write/read/delete of opaque blobs by key.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Generates a collision-free storage key for an upload:
/// `resume-<unix millis>-<random below 1e9><ext>`.
///
/// `ext` is the lowercased extension including its dot.
pub fn fingerprint(ext: &str) -> String {
    let random = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("resume-{}-{}{}", Utc::now().timestamp_millis(), random, ext)
}

/// Keys are flat names; anything that could escape the storage root is refused.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
