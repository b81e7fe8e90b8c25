use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::BlobStore;
use crate::error::FetchError;

/// Serves objects from a local directory, with the object key as the relative path.
///
/// The bucket name is ignored: `root` stands in for the bucket.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let path = self.root.join(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(FetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(err) => Err(FetchError::Transport {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(err),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[tokio::test]
    async fn test_fetch_existing_object() {
        let root = env::temp_dir().join("nmi_summarizer_local_store");
        fs::create_dir_all(root.join("nmi")).unwrap();
        fs::write(root.join("nmi/meter.csv"), "AESTTime,E\n").unwrap();

        let store = LocalBlobStore::new(&root);
        let bytes = store.fetch("any-bucket", "nmi/meter.csv").await.unwrap();
        assert_eq!(&bytes[..], b"AESTTime,E\n");

        fs::remove_file(root.join("nmi/meter.csv")).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_missing_object_is_not_found() {
        let store = LocalBlobStore::new(env::temp_dir());
        let err = store
            .fetch("any-bucket", "nmi/does-not-exist.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }
}
