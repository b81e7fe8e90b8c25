use aws_sdk_s3::config::Region;
use bytes::Bytes;
use tracing::debug;

use super::BlobStore;
use crate::config::StorageConfig;
use crate::error::FetchError;

/// Fetches objects from S3 (or any S3-compatible endpoint).
///
/// Credentials come from the ambient AWS configuration (env vars, profile,
/// instance role); region and endpoint come from [`StorageConfig`].
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds a client pinned to the configured region and endpoint.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::from_env()
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(&config.endpoint)
            .build();

        Self::new(aws_sdk_s3::Client::from_conf(s3_config))
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let no_such_key = err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_key());
                if no_such_key {
                    FetchError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    FetchError::Transport {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        source: Box::new(err),
                    }
                }
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|err| FetchError::Transport {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(err),
            })?;

        let bytes = body.into_bytes();
        debug!(bucket, key, bytes = bytes.len(), "S3 object downloaded");
        Ok(bytes)
    }
}
