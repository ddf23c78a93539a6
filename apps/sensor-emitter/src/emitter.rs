use anyhow::{Context, Result};
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::publisher::{PublishReceipt, RecordPublisher};
use crate::reading::{ReadingGenerator, SensorReading};

#[derive(Debug, Clone)]
pub struct SentReading {
    pub reading: SensorReading,
    pub receipt: PublishReceipt,
}

pub struct Emitter<P, R, C> {
    publisher: P,
    generator: ReadingGenerator<R>,
    clock: C,
    stream_name: String,
    interval: Duration,
}

impl<P, R, C> Emitter<P, R, C>
where
    P: RecordPublisher,
    R: Rng,
    C: Clock,
{
    pub fn new(
        publisher: P,
        generator: ReadingGenerator<R>,
        clock: C,
        stream_name: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            publisher,
            generator,
            clock,
            stream_name: stream_name.into(),
            interval,
        }
    }

    /// Generates one reading and publishes it keyed by its device id.
    pub async fn tick(&mut self) -> Result<SentReading> {
        let reading = self.generator.next_reading(self.clock.now());
        let payload = reading
            .to_payload()
            .context("failed to serialize reading")?;
        let receipt = self
            .publisher
            .publish(&self.stream_name, &reading.device_id, payload)
            .await?;
        Ok(SentReading { reading, receipt })
    }

    /// Publishes readings until `cancel` fires, waiting `interval` after each
    /// publish completes. The first reading goes out immediately. A publish
    /// error ends the loop.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<u64> {
        let mut sent = 0u64;

        while !cancel.is_cancelled() {
            let SentReading { reading, receipt } = self.tick().await?;
            sent += 1;
            tracing::info!(
                device_id = %reading.device_id,
                temperature = reading.temperature,
                humidity = reading.humidity,
                shard_id = %receipt.shard_id,
                sequence_number = %receipt.sequence_number,
                "sent record"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(sent, stream = %self.stream_name, "emitter stopped");
        Ok(sent)
    }
}
