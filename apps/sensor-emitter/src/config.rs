use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub stream_name: String,
    pub aws_region: String,
    pub kinesis_endpoint: Option<String>,

    pub interval: Duration,
    pub device_count: u32,
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);

        let stream_name = vars.string("EMITTER_STREAM_NAME", Some("my-streaming-logs"))?;
        let aws_region = match vars.optional("EMITTER_AWS_REGION") {
            Some(region) => region,
            None => vars.string("AWS_REGION", Some("us-east-1"))?,
        };
        let kinesis_endpoint = vars.optional("EMITTER_KINESIS_ENDPOINT");

        let interval = Duration::from_millis(vars.u64("EMITTER_INTERVAL_MS", Some(1000))?);
        let device_count = u32::try_from(vars.u64("EMITTER_DEVICE_COUNT", Some(100))?)
            .context("EMITTER_DEVICE_COUNT out of range")?;

        let seed = match vars.optional("EMITTER_SEED") {
            Some(raw) => Some(raw.parse::<u64>().context("invalid EMITTER_SEED")?),
            None => None,
        };

        let config = Self {
            stream_name,
            aws_region,
            kinesis_endpoint,
            interval,
            device_count,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream_name.is_empty() {
            bail!("EMITTER_STREAM_NAME must not be empty");
        }
        if self.device_count == 0 {
            bail!("EMITTER_DEVICE_COUNT must be at least 1");
        }
        if self.interval.is_zero() {
            bail!("EMITTER_INTERVAL_MS must be at least 1");
        }
        Ok(())
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
