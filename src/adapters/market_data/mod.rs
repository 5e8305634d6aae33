//! Market Data Adapters
//!
//! - `csv_replay`: historical closes replayed slice by slice

pub mod csv_replay;

pub use csv_replay::{parse_timestamp, CsvReplayFeed, ReplayWindow};
