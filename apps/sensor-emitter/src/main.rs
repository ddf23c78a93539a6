mod clock;
mod config;
mod emitter;
mod publisher;
mod reading;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::emitter::Emitter;
use crate::publisher::KinesisPublisher;
use crate::reading::ReadingGenerator;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sensor_emitter=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let publisher = KinesisPublisher::from_config(&config).await;
    let mut emitter = Emitter::new(
        publisher,
        ReadingGenerator::new(rng, config.device_count),
        SystemClock,
        config.stream_name.clone(),
        config.interval,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
        }
        signal_cancel.cancel();
    });

    tracing::info!(
        stream = %config.stream_name,
        region = %config.aws_region,
        interval_ms = config.interval.as_millis() as u64,
        devices = config.device_count,
        "sensor-emitter started"
    );
    emitter.run(cancel).await?;

    Ok(())
}
