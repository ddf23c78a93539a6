
use flate2::Compression;
use std::sync::Arc;

use crate::bucket::{append_lines, bucket_key, gunzip, gzip};
use crate::clock::Clock;
use crate::event::{decode_batch, InvocationResult, KinesisEvent};
use crate::store::{BlobStore, ObjectMetadata, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CompactError {
    #[error("failed to read bucket {key}: {source}")]
    Read { key: String, source: StoreError },
    #[error("existing bucket {key} could not be decompressed: {source}")]
    Corrupt {
        key: String,
        source: std::io::Error,
    },
    #[error("failed to compress bucket {key}: {source}")]
    Compress {
        key: String,
        source: std::io::Error,
    },
    #[error("failed to write bucket {key}: {source}")]
    Write { key: String, source: StoreError },
}

impl CompactError {
    pub fn key(&self) -> &str {
        match self {
            Self::Read { key, .. }
            | Self::Corrupt { key, .. }
            | Self::Compress { key, .. }
            | Self::Write { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionOutcome {
    pub records: usize,
    /// Bucket that was rewritten; `None` when nothing in the batch decoded.
    pub key: Option<String>,
}

/// Appends decoded batches onto the bucket of the current UTC minute.
///
/// Each call is a full read-modify-write of one object with no version check.
/// Two calls that overlap on the same key can both read the old body and the
/// later write drops the earlier one's records.
pub struct Compactor {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    key_prefix: String,
    level: Compression,
}

impl Compactor {
    pub fn new(
        store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        key_prefix: impl Into<String>,
        level: Compression,
    ) -> Self {
        Self {
            store,
            clock,
            key_prefix: key_prefix.into(),
            level,
        }
    }

    pub async fn compact(&self, event: &KinesisEvent) -> Result<CompactionOutcome, CompactError> {
        let lines = decode_batch(&event.records);
        let skipped = event.records.len() - lines.len();
        if lines.is_empty() {
            tracing::info!(
                received = event.records.len(),
                skipped,
                "no decodable records in batch; bucket untouched"
            );
            return Ok(CompactionOutcome {
                records: 0,
                key: None,
            });
        }

        let key = bucket_key(&self.key_prefix, self.clock.now());
        let existing = self.read_existing(&key).await?;
        let combined = append_lines(&existing, &lines);

        let body = gzip(&combined, self.level).map_err(|source| CompactError::Compress {
            key: key.clone(),
            source,
        })?;
        let compressed_bytes = body.len();

        if let Err(source) = self
            .store
            .put(&key, body, &ObjectMetadata::gzip_ndjson())
            .await
        {
            tracing::error!(key = %key, error = %source, "failed to write bucket");
            return Err(CompactError::Write { key, source });
        }

        tracing::info!(
            records = lines.len(),
            skipped,
            key = %key,
            compressed_bytes,
            "appended records to bucket"
        );
        Ok(CompactionOutcome {
            records: lines.len(),
            key: Some(key),
        })
    }

    /// Runs one invocation and shapes the runtime response. Errors are returned
    /// as-is so the runtime can redeliver the batch.
    pub async fn handle_event(&self, event: &KinesisEvent) -> Result<InvocationResult, CompactError> {
        let outcome = self.compact(event).await?;
        Ok(InvocationResult::processed(outcome.records))
    }

    async fn read_existing(&self, key: &str) -> Result<String, CompactError> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(key = %key, "bucket does not exist yet; starting empty");
                return Ok(String::new());
            }
            Err(source) => {
                tracing::error!(key = %key, error = %source, "failed to read bucket");
                return Err(CompactError::Read {
                    key: key.to_string(),
                    source,
                });
            }
        };

        gunzip(&bytes).map_err(|source| {
            tracing::error!(key = %key, error = %source, "existing bucket is unreadable");
            CompactError::Corrupt {
                key: key.to_string(),
                source,
            }
        })
    }
}
