use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Batch delivered by the Kinesis event source mapping.
///
/// Entries are parsed one by one: an entry of the wrong shape is kept as a
/// rejected record so it fails in `decode_record` at its own index instead of
/// failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KinesisEvent {
    #[serde(rename = "Records", default, deserialize_with = "entries")]
    pub records: Vec<KinesisEventRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KinesisEventRecord {
    #[serde(default)]
    pub kinesis: KinesisPayload,
    #[serde(
        rename = "eventID",
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,
    #[serde(skip)]
    pub rejected: Option<String>,
}

// Only `data` is consumed; the rest is kept for log context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisPayload {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub partition_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence_number: Option<String>,
}

fn entries<'de, D>(deserializer: D) -> Result<Vec<KinesisEventRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<JsonValue>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(KinesisEventRecord::from_value)
        .collect())
}

// Log-only metadata: anything but a string is dropped.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(value) => Some(value),
        _ => None,
    })
}

impl KinesisEventRecord {
    /// Parses a single batch entry. Never fails: a malformed entry comes back
    /// with `rejected` set.
    pub fn from_value(value: JsonValue) -> Self {
        match serde_json::from_value(value) {
            Ok(record) => record,
            Err(err) => Self {
                rejected: Some(err.to_string()),
                ..Self::default()
            },
        }
    }

    /// Wraps an already-serialized JSON payload the way the event source would deliver it.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            kinesis: KinesisPayload {
                data: Some(base64::engine::general_purpose::STANDARD.encode(payload)),
                partition_key: None,
                sequence_number: None,
            },
            event_id: None,
            rejected: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("record has an unexpected shape: {0}")]
    Shape(String),
    #[error("record has no kinesis.data payload")]
    MissingData,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes one record into a single-line JSON document.
pub fn decode_record(record: &KinesisEventRecord) -> Result<String, DecodeError> {
    if let Some(reason) = &record.rejected {
        return Err(DecodeError::Shape(reason.clone()));
    }
    let data = record
        .kinesis
        .data
        .as_deref()
        .ok_or(DecodeError::MissingData)?;
    let payload = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    let value: JsonValue = serde_json::from_slice(&payload)?;
    Ok(serde_json::to_string(&value)?)
}

/// Decodes every record in delivery order. Malformed records are logged and dropped.
pub fn decode_batch(records: &[KinesisEventRecord]) -> Vec<String> {
    let mut lines = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match decode_record(record) {
            Ok(line) => lines.push(line),
            Err(err) => {
                tracing::warn!(
                    index,
                    sequence_number = record.kinesis.sequence_number.as_deref().unwrap_or("-"),
                    error = %err,
                    "skipping undecodable record"
                );
            }
        }
    }
    lines
}

/// Response handed back to the invoking runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResult {
    pub fn processed(records: usize) -> Self {
        Self {
            status_code: 200,
            body: format!("Processed {records} records."),
        }
    }
}
