use anyhow::{anyhow, bail, Context, Result};
use flate2::Compression;
use std::env;
use std::path::PathBuf;

use crate::bucket::DEFAULT_KEY_PREFIX;

const DEFAULT_BUCKET: &str = "carras-real-time-data-processing-project";
const DEFAULT_REGION: &str = "us-east-1";
// Largest event payload the delivery runtime hands to a single invocation.
pub const DEFAULT_HTTP_MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    S3,
    Fs,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bucket: String,
    pub key_prefix: String,
    pub aws_region: String,
    pub s3_endpoint: Option<String>,

    pub store: StoreBackend,
    pub fs_root: PathBuf,

    pub gzip_level: u32,
    pub http_bind: String,
    pub http_max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // A missing .env is the normal case outside local development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let bucket = vars.string("COMPACTOR_BUCKET", Some(DEFAULT_BUCKET))?;
        if bucket.is_empty() {
            bail!("COMPACTOR_BUCKET must not be empty");
        }
        let key_prefix = vars.string("COMPACTOR_KEY_PREFIX", Some(DEFAULT_KEY_PREFIX))?;

        let aws_region = match vars.optional("COMPACTOR_AWS_REGION") {
            Some(region) => region,
            None => vars.string("AWS_REGION", Some(DEFAULT_REGION))?,
        };
        let s3_endpoint = vars.optional("COMPACTOR_S3_ENDPOINT");

        let store = match vars.string("COMPACTOR_STORE", Some("s3"))?.to_lowercase().as_str() {
            "s3" => StoreBackend::S3,
            "fs" | "file" => StoreBackend::Fs,
            other => bail!("invalid COMPACTOR_STORE {other:?} (expected s3 or fs)"),
        };
        let fs_root = PathBuf::from(vars.string("COMPACTOR_FS_ROOT", Some("./data"))?);

        let gzip_level = vars.u64("COMPACTOR_GZIP_LEVEL", Some(6))?.clamp(1, 9) as u32;
        let http_bind = vars.string("COMPACTOR_HTTP_BIND", Some("127.0.0.1:9102"))?;
        let http_max_body_bytes = usize::try_from(vars.u64(
            "COMPACTOR_HTTP_MAX_BODY_BYTES",
            Some(DEFAULT_HTTP_MAX_BODY_BYTES as u64),
        )?)
        .context("COMPACTOR_HTTP_MAX_BODY_BYTES out of range")?;
        if http_max_body_bytes == 0 {
            bail!("COMPACTOR_HTTP_MAX_BODY_BYTES must be at least 1");
        }

        Ok(Self {
            bucket,
            key_prefix,
            aws_region,
            s3_endpoint,
            store,
            fs_root,
            gzip_level,
            http_bind,
            http_max_body_bytes,
        })
    }

    pub fn compression(&self) -> Compression {
        Compression::new(self.gzip_level)
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn string(&self, key: &str, default: Option<&str>) -> Result<String> {
        match (self.0)(key) {
            Some(value) => Ok(value.trim().to_string()),
            None => default
                .map(str::to_string)
                .ok_or_else(|| anyhow!("missing env var {key}")),
        }
    }

    fn u64(&self, key: &str, default: Option<u64>) -> Result<u64> {
        match (self.0)(key) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid {key}")),
            None => default.ok_or_else(|| anyhow!("missing env var {key}")),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_target_the_raw_streaming_prefix_on_s3() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bucket, DEFAULT_BUCKET);
        assert_eq!(config.key_prefix, "raw/streaming");
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.store, StoreBackend::S3);
        assert_eq!(config.gzip_level, 6);
        assert!(config.s3_endpoint.is_none());
        assert_eq!(config.http_max_body_bytes, 6 * 1024 * 1024);
    }

    #[test]
    fn body_limit_is_configurable_but_not_zero() {
        let config = config_from(&[("COMPACTOR_HTTP_MAX_BODY_BYTES", "16777216")]).unwrap();
        assert_eq!(config.http_max_body_bytes, 16 * 1024 * 1024);

        let err = config_from(&[("COMPACTOR_HTTP_MAX_BODY_BYTES", "0")]).unwrap_err();
        assert!(err.to_string().contains("COMPACTOR_HTTP_MAX_BODY_BYTES"), "{err}");
    }

    #[test]
    fn compactor_region_wins_over_aws_region() {
        let config = config_from(&[
            ("AWS_REGION", "eu-west-1"),
            ("COMPACTOR_AWS_REGION", " ap-south-1 "),
        ])
        .unwrap();
        assert_eq!(config.aws_region, "ap-south-1");

        let config = config_from(&[("AWS_REGION", "eu-west-1")]).unwrap();
        assert_eq!(config.aws_region, "eu-west-1");
    }

    #[test]
    fn fs_backend_and_level_clamping() {
        let config = config_from(&[
            ("COMPACTOR_STORE", "FS"),
            ("COMPACTOR_FS_ROOT", "/tmp/buckets"),
            ("COMPACTOR_GZIP_LEVEL", "42"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Fs);
        assert_eq!(config.fs_root, PathBuf::from("/tmp/buckets"));
        assert_eq!(config.gzip_level, 9);
    }

    #[test]
    fn rejects_unknown_backend_and_bad_numbers() {
        let err = config_from(&[("COMPACTOR_STORE", "gcs")]).unwrap_err();
        assert!(err.to_string().contains("COMPACTOR_STORE"), "{err}");

        let err = config_from(&[("COMPACTOR_GZIP_LEVEL", "max")]).unwrap_err();
        assert!(err.to_string().contains("COMPACTOR_GZIP_LEVEL"), "{err}");

        assert!(config_from(&[("COMPACTOR_BUCKET", "  ")]).is_err());
    }
}
