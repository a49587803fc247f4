//! Object storage for uploaded wireframe images.
//!
//! The original deployment kept wireframes in a cloud bucket; here the
//! [`ObjectStorage`] trait abstracts the backend so production can use S3
//! while development and tests use a local directory served by the HTTP
//! layer. Objects live under a fixed prefix with a timestamp-derived
//! filename, and every stored object has a stable public URL recorded on the
//! generation record.
//!
//! Deletion works URL-first: the delete flow maps a record's `image_url` back
//! to a storage key via [`ObjectStorage::key_for_url`] and removes the object
//! before the database row is touched.

mod local;
mod s3;

pub use local::LocalObjectStorage;
pub use s3::S3ObjectStorage;

use crate::config::{Config, StorageConfig};
use crate::types::abbrev_uuid;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// No object under the given key
    #[error("object not found")]
    NotFound,

    #[error("storage I/O error")]
    Io(#[from] std::io::Error),

    /// Catch-all for backend-specific failures
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Request to store one uploaded image
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub content: Bytes,
    pub content_type: String,
}

/// A stored object: the backend key and the public retrieval URL
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Trait for wireframe image storage backends
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store image content and return its key and public URL
    async fn store(&self, request: StoreRequest) -> Result<StoredObject>;

    /// Delete the object under the given key
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether an object exists under the given key
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Map a public URL minted by this backend back to its storage key.
    /// Returns None for URLs this backend did not produce.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Build an object key: `{prefix}/{unix_millis}_{short-uuid}.{ext}`.
///
/// The filename is timestamp-derived (matching the documented object layout)
/// with a short uuid suffix so two uploads in the same millisecond cannot
/// collide.
pub(crate) fn object_key(prefix: &str, content_type: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = abbrev_uuid(&uuid::Uuid::new_v4());
    let ext = extension_for(content_type);
    format!("{prefix}/{millis}_{suffix}.{ext}")
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Create an object storage backend based on configuration
pub async fn create_object_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    match &config.storage {
        StorageConfig::Local { path, .. } => {
            tracing::info!("Creating local object storage backend (path: {:?})", path);
            tokio::fs::create_dir_all(path).await?;
            Ok(Arc::new(LocalObjectStorage::new(
                path.clone(),
                config.storage.prefix().to_string(),
                config.local_uploads_base(),
            )))
        }
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
            public_url_base,
            ..
        } => {
            tracing::info!("Creating S3 object storage backend (bucket: {})", bucket);
            let storage = S3ObjectStorage::connect(
                bucket.clone(),
                region.clone(),
                endpoint.clone(),
                config.storage.prefix().to_string(),
                public_url_base.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }
    }
}
