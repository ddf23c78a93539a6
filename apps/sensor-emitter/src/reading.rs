use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 20.0..=30.0;
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 30.0..=50.0;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: String,
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
}

impl SensorReading {
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Draws readings for a fixed pool of `device-1..=device-N` identifiers.
pub struct ReadingGenerator<R> {
    rng: R,
    device_count: u32,
}

impl<R: Rng> ReadingGenerator<R> {
    pub fn new(rng: R, device_count: u32) -> Self {
        Self {
            rng,
            device_count: device_count.max(1),
        }
    }

    pub fn next_reading(&mut self, now: DateTime<Utc>) -> SensorReading {
        let device = self.rng.gen_range(1..=self.device_count);
        SensorReading {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            device_id: format!("device-{device}"),
            temperature: round2(self.rng.gen_range(TEMPERATURE_RANGE)),
            humidity: round2(self.rng.gen_range(HUMIDITY_RANGE)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(micros: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 18, 15, 45, 0)
            .single()
            .unwrap()
            + chrono::Duration::microseconds(i64::from(micros))
    }

    fn decimals(value: f64) -> usize {
        let text = value.to_string();
        text.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
    }

    #[test]
    fn timestamp_is_iso8601_with_microseconds() {
        let mut generator = ReadingGenerator::new(StdRng::seed_from_u64(7), 100);
        assert_eq!(
            generator.next_reading(at(123_456)).timestamp,
            "2024-12-18T15:45:00.123456"
        );
        assert_eq!(
            generator.next_reading(at(0)).timestamp,
            "2024-12-18T15:45:00.000000"
        );
    }

    #[test]
    fn values_stay_within_bounds_and_two_decimals() {
        let mut generator = ReadingGenerator::new(StdRng::seed_from_u64(42), 100);
        for _ in 0..2_000 {
            let reading = generator.next_reading(at(0));
            assert!(TEMPERATURE_RANGE.contains(&reading.temperature), "{reading:?}");
            assert!(HUMIDITY_RANGE.contains(&reading.humidity), "{reading:?}");
            assert!(decimals(reading.temperature) <= 2, "{reading:?}");
            assert!(decimals(reading.humidity) <= 2, "{reading:?}");

            let n: u32 = reading
                .device_id
                .strip_prefix("device-")
                .and_then(|n| n.parse().ok())
                .unwrap();
            assert!((1..=100).contains(&n), "{reading:?}");
        }
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = ReadingGenerator::new(StdRng::seed_from_u64(99), 10);
        let mut b = ReadingGenerator::new(StdRng::seed_from_u64(99), 10);
        for _ in 0..20 {
            assert_eq!(a.next_reading(at(5)), b.next_reading(at(5)));
        }
    }

    #[test]
    fn single_device_pool_always_uses_device_1() {
        let mut generator = ReadingGenerator::new(StdRng::seed_from_u64(1), 1);
        for _ in 0..50 {
            assert_eq!(generator.next_reading(at(0)).device_id, "device-1");
        }
    }

    #[test]
    fn payload_is_flat_json_in_field_order() {
        let reading = SensorReading {
            timestamp: "2024-12-18T15:45:00.123456".to_string(),
            device_id: "device-42".to_string(),
            temperature: 24.5,
            humidity: 33.01,
        };
        assert_eq!(
            String::from_utf8(reading.to_payload().unwrap()).unwrap(),
            r#"{"timestamp":"2024-12-18T15:45:00.123456","device_id":"device-42","temperature":24.5,"humidity":33.01}"#
        );
    }
}
