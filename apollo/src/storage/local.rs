//! Local filesystem storage backend.
//!
//! Stores images under a base directory; the HTTP layer serves that
//! directory at `/uploads/*` so the minted URLs resolve against this
//! service. Useful for development and testing.

use super::{ObjectStorage, Result, StorageError, StoreRequest, StoredObject, object_key};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub struct LocalObjectStorage {
    base_path: PathBuf,
    prefix: String,
    /// URL under which `base_path` is served, without trailing slash,
    /// e.g. `http://localhost:4000/uploads`.
    public_base: String,
}

impl LocalObjectStorage {
    pub fn new(base_path: PathBuf, prefix: String, public_base: String) -> Self {
        Self {
            base_path,
            prefix,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn store(&self, request: StoreRequest) -> Result<StoredObject> {
        let key = object_key(&self.prefix, &request.content_type);
        let full_path = self.base_path.join(&key);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&request.content).await?;
        file.sync_all().await?;

        Ok(StoredObject {
            url: self.url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.base_path.join(key);

        if !full_path.exists() {
            return Err(StorageError::NotFound);
        }

        fs::remove_file(&full_path).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.base_path.join(key).exists())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", self.public_base)).map(|key| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn storage(dir: &std::path::Path) -> LocalObjectStorage {
        LocalObjectStorage::new(
            dir.to_path_buf(),
            "wireframes".to_string(),
            "http://localhost:4000/uploads".to_string(),
        )
    }

    #[tokio::test]
    async fn store_exists_delete_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(temp_dir.path());

        let stored = storage
            .store(StoreRequest {
                content: Bytes::from_static(b"not really a png"),
                content_type: "image/png".to_string(),
            })
            .await
            .unwrap();

        assert!(stored.key.starts_with("wireframes/"));
        assert!(stored.url.starts_with("http://localhost:4000/uploads/wireframes/"));
        assert!(storage.exists(&stored.key).await.unwrap());

        storage.delete(&stored.key).await.unwrap();
        assert!(!storage.exists(&stored.key).await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_object_is_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(temp_dir.path());

        let result = storage.delete("wireframes/nope.png").await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[test]
    fn url_round_trips_to_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(temp_dir.path());

        let key = "wireframes/1740000000000_abcd1234.png";
        let url = storage.url_for(key);
        assert_eq!(storage.key_for_url(&url).as_deref(), Some(key));

        // Foreign URLs (a different host's bucket) do not map to a key.
        assert_eq!(storage.key_for_url("https://elsewhere.example.com/x.png"), None);
    }
}
