use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client as KinesisClient;
use aws_types::region::Region;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub shard_id: String,
    pub sequence_number: String,
}

/// Append-only log the emitter writes to. Records sharing a partition key land
/// on the same shard in publish order.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    async fn publish(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: Vec<u8>,
    ) -> Result<PublishReceipt>;
}

pub struct KinesisPublisher {
    client: KinesisClient,
}

impl KinesisPublisher {
    pub fn new(client: KinesisClient) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_kinesis::config::Builder::from(&shared);
        if let Some(endpoint) = &config.kinesis_endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(KinesisClient::from_conf(builder.build()))
    }
}

#[async_trait]
impl RecordPublisher for KinesisPublisher {
    async fn publish(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: Vec<u8>,
    ) -> Result<PublishReceipt> {
        let output = self
            .client
            .put_record()
            .stream_name(stream_name)
            .partition_key(partition_key)
            .data(Blob::new(payload))
            .send()
            .await
            .map_err(|err| anyhow!("put_record to {stream_name}: {}", DisplayErrorContext(&err)))?;

        Ok(PublishReceipt {
            shard_id: output.shard_id().to_string(),
            sequence_number: output.sequence_number().to_string(),
        })
    }
}
