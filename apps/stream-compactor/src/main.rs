use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::future::IntoFuture;
use std::io::Read;
use std::sync::Arc;
use stream_compactor::clock::{Clock, FixedClock, SystemClock};
use stream_compactor::config::{Config, StoreBackend};
use stream_compactor::event::KinesisEvent;
use stream_compactor::http;
use stream_compactor::store::{BlobStore, FsBlobStore, S3BlobStore};
use stream_compactor::Compactor;

#[derive(Parser, Debug)]
#[command(
    name = "stream-compactor",
    version,
    about = "Appends Kinesis batches to per-minute gzip NDJSON buckets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accept batches over HTTP (POST /v1/invoke).
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Compact a single event read from a file, or stdin with `-`.
    Invoke {
        #[arg(long, default_value = "-")]
        event: String,
        /// Target the bucket of this instant instead of now (RFC 3339).
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,stream_compactor=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

async fn build_store(config: &Config) -> Arc<dyn BlobStore> {
    match config.store {
        StoreBackend::S3 => {
            tracing::info!(bucket=%config.bucket, region=%config.aws_region, "using S3 bucket store");
            Arc::new(S3BlobStore::from_config(config).await)
        }
        StoreBackend::Fs => {
            tracing::info!(root=%config.fs_root.display(), "using filesystem bucket store");
            Arc::new(FsBlobStore::new(config.fs_root.clone()))
        }
    }
}

fn read_event(source: &str) -> Result<KinesisEvent> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read event {source}"))?
    };
    serde_json::from_str(&raw).context("event is not a valid Kinesis batch")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing()?;

    let store = build_store(&config).await;

    match cli.command {
        Command::Serve { bind } => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let compactor = Compactor::new(store, clock, &config.key_prefix, config.compression());
            let app = http::router(http::HttpState {
                compactor: Arc::new(compactor),
                max_body_bytes: config.http_max_body_bytes,
            });
            let bind = bind.unwrap_or_else(|| config.http_bind.clone());
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            tracing::info!(bind=%bind, "stream-compactor HTTP listening");

            tokio::select! {
                res = axum::serve(listener, app).into_future() => {
                    res.context("HTTP server exited")?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received");
                }
            }
        }
        Command::Invoke { event, at } => {
            let clock: Arc<dyn Clock> = match at {
                Some(at) => Arc::new(FixedClock(at)),
                None => Arc::new(SystemClock),
            };
            let compactor = Compactor::new(store, clock, &config.key_prefix, config.compression());
            let event = read_event(&event)?;
            let result = compactor.handle_event(&event).await?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
