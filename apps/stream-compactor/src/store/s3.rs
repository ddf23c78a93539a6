use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;

use super::{BlobStore, ObjectMetadata, StoreError};
use crate::config::Config;

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds a client from the default credential chain. A custom endpoint
    /// (MinIO, LocalStack) switches to path-style addressing.
    pub async fn from_config(config: &Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self::new(S3Client::from_conf(builder.build()), config.bucket.clone())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key())
                {
                    return Ok(None);
                }
                return Err(StoreError::Service(format!(
                    "get s3://{}/{key}: {}",
                    self.bucket,
                    DisplayErrorContext(&err)
                )));
            }
        };

        let body = output.body.collect().await.map_err(|err| {
            StoreError::Service(format!("read body of s3://{}/{key}: {err}", self.bucket))
        })?;
        Ok(Some(body.into_bytes().to_vec()))
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(&metadata.content_type)
            .set_content_encoding(metadata.content_encoding.clone())
            .send()
            .await
            .map_err(|err| {
                StoreError::Service(format!(
                    "put s3://{}/{key}: {}",
                    self.bucket,
                    DisplayErrorContext(&err)
                ))
            })?;
        Ok(())
    }
}
