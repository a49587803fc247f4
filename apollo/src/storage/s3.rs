//! S3 object storage backend.
//!
//! Production backend for wireframe images. Works against AWS or any
//! S3-compatible store (MinIO, R2) via the optional endpoint override, which
//! also switches to path-style addressing.

use super::{ObjectStorage, Result, StorageError, StoreRequest, StoredObject, object_key};
use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use url::Url;

pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
    /// Base URL the bucket contents are reachable under, without trailing
    /// slash (CDN or website endpoint).
    public_base: String,
}

impl S3ObjectStorage {
    /// Connect to S3 using the ambient AWS credential chain.
    pub async fn connect(
        bucket: String,
        region: Option<String>,
        endpoint: Option<Url>,
        prefix: String,
        public_url_base: Url,
    ) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let shared_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint {
            // Custom endpoints (MinIO etc.) rarely support virtual-hosted
            // bucket addressing.
            builder = builder.endpoint_url(endpoint.as_str().trim_end_matches('/')).force_path_style(true);
        }

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket,
            prefix,
            public_base: public_url_base.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn store(&self, request: StoreRequest) -> Result<StoredObject> {
        let key = object_key(&self.prefix, &request.content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&request.content_type)
            .body(ByteStream::from(request.content.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::Other(anyhow!("failed to put s3 object {key}: {e}")))?;

        Ok(StoredObject {
            url: self.url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Other(anyhow!("failed to delete s3 object {key}: {e}")))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    Ok(false)
                } else {
                    Err(StorageError::Other(anyhow!("failed to head s3 object {key}: {err}")))
                }
            }
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", self.public_base)).map(|key| key.to_string())
    }
}
