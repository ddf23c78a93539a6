pub mod bucket;
pub mod clock;
pub mod compactor;
pub mod config;
pub mod event;
pub mod http;
pub mod store;

pub use compactor::{CompactError, CompactionOutcome, Compactor};
