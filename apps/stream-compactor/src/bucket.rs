use chrono::{DateTime, Utc};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

pub const DEFAULT_KEY_PREFIX: &str = "raw/streaming";
pub const BUCKET_CONTENT_TYPE: &str = "application/json";
pub const BUCKET_CONTENT_ENCODING: &str = "gzip";

const BUCKET_STEM: &str = "streaming_data_";
const BUCKET_SUFFIX: &str = ".json.gz";
const MINUTE_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Object key of the bucket that owns `now`, truncated to the UTC minute:
/// `{prefix}/streaming_data_2024-12-18_15-45.json.gz`.
pub fn bucket_key(prefix: &str, now: DateTime<Utc>) -> String {
    let minute = now.format(MINUTE_FORMAT);
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{BUCKET_STEM}{minute}{BUCKET_SUFFIX}")
    } else {
        format!("{prefix}/{BUCKET_STEM}{minute}{BUCKET_SUFFIX}")
    }
}

/// Appends `lines` to `existing`, one per line, with a trailing newline.
/// `existing` is taken verbatim; a bucket written by this module already ends in `\n`.
pub fn append_lines(existing: &str, lines: &[String]) -> String {
    let added: usize = lines.iter().map(|line| line.len() + 1).sum();
    let mut combined = String::with_capacity(existing.len() + added);
    combined.push_str(existing);
    combined.push_str(&lines.join("\n"));
    combined.push('\n');
    combined
}

pub fn gzip(content: &str, level: Compression) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(content.len() / 4), level);
    encoder.write_all(content.as_bytes())?;
    encoder.finish()
}

/// Inflates a stored bucket. Concatenated gzip members are read through to the end.
/// Non-UTF-8 content surfaces as `InvalidData`.
pub fn gunzip(bytes: &[u8]) -> io::Result<String> {
    if bytes.is_empty() {
        return Ok(String::new());
    }
    let mut decoder = MultiGzDecoder::new(bytes);
    let mut content = String::new();
    decoder.read_to_string(&mut content)?;
    Ok(content)
}
