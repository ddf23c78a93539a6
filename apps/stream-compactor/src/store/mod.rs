//! Blob storage seam for persisted buckets.
//!
//! A missing key is not an error: `get` returns `Ok(None)` and the compactor
//! treats the bucket as empty. Every other failure is a `StoreError`.

mod fs;
#[cfg(test)]
pub(crate) mod memory;
mod s3;

pub use fs::FsBlobStore;
pub use s3::S3BlobStore;

use async_trait::async_trait;

use crate::bucket::{BUCKET_CONTENT_ENCODING, BUCKET_CONTENT_TYPE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub content_encoding: Option<String>,
}

impl ObjectMetadata {
    pub fn gzip_ndjson() -> Self {
        Self {
            content_type: BUCKET_CONTENT_TYPE.to_string(),
            content_encoding: Some(BUCKET_CONTENT_ENCODING.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object store request failed: {0}")]
    Service(String),
    #[error("invalid object key {0:?}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Full object body, or `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditional overwrite of the whole object.
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<(), StoreError>;
}
