//! Object storage access.
//!
//! [`BlobStore`] is the async trait for retrieving an object's full contents.
//! [`S3BlobStore`] implements it on top of `aws-sdk-s3`; [`LocalBlobStore`]
//! serves objects from a directory on disk.

mod local;
mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

use crate::error::FetchError;
use bytes::Bytes;

/// Retrieves an object's bytes given a bucket name and an object key.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError>;
}

#[async_trait::async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Box<T> {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(bucket, key).await
    }
}
