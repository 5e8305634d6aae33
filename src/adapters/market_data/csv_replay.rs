//! CSV Replay Feed
//!
//! Replays historical closes as price slices. Expected format:
//!
//! ```text
//! timestamp,symbol,close
//! 2022-01-03,KO,59.30
//! 2022-01-03,PEP,173.10
//! ```
//!
//! Rows sharing a timestamp form one slice. Timestamps are RFC 3339 or a
//! plain `YYYY-MM-DD` date (midnight UTC).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, VecDeque};
use std::io::Read;
use std::path::Path;

use crate::domain::{Instrument, PriceSlice};
use crate::ports::market_data::{MarketDataError, MarketDataPort};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    symbol: String,
    close: f64,
}

/// Inclusive date range applied while loading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReplayWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Market data feed backed by a CSV file, fully loaded up front
#[derive(Debug, Clone)]
pub struct CsvReplayFeed {
    slices: VecDeque<PriceSlice>,
    total: usize,
}

impl CsvReplayFeed {
    pub fn from_path<P: AsRef<Path>>(path: P, window: ReplayWindow) -> Result<Self, MarketDataError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            MarketDataError::SourceError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let feed = Self::from_reader(file, window)?;
        tracing::info!("Loaded {} slices from {}", feed.total, path.display());
        Ok(feed)
    }

    pub fn from_reader<R: Read>(reader: R, window: ReplayWindow) -> Result<Self, MarketDataError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut grouped: BTreeMap<DateTime<Utc>, PriceSlice> = BTreeMap::new();

        for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
            // Header is line 1
            let line = index + 2;
            let row = result.map_err(|e| MarketDataError::ParseError(format!("line {}: {}", line, e)))?;
            let timestamp = parse_timestamp(&row.timestamp)
                .map_err(|e| MarketDataError::ParseError(format!("line {}: {}", line, e)))?;

            if !window.contains(&timestamp) {
                continue;
            }

            grouped
                .entry(timestamp)
                .or_insert_with(|| PriceSlice::new(timestamp))
                .insert(Instrument::new(row.symbol), row.close);
        }

        let slices: VecDeque<PriceSlice> = grouped.into_values().collect();
        let total = slices.len();
        Ok(Self { slices, total })
    }

    /// Slices not yet delivered
    pub fn remaining(&self) -> usize {
        self.slices.len()
    }

    /// Slices loaded in total
    pub fn total(&self) -> usize {
        self.total
    }
}

#[async_trait]
impl MarketDataPort for CsvReplayFeed {
    async fn next_slice(&mut self) -> Result<Option<PriceSlice>, MarketDataError> {
        Ok(self.slices.pop_front())
    }
}

/// Parse an RFC 3339 timestamp or a bare date
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
timestamp,symbol,close
2022-01-04,KO,59.9
2022-01-03,KO,59.3
2022-01-03,PEP,173.1
2022-01-04,PEP,172.0
2022-01-05,KO,60.2
";

    #[tokio::test]
    async fn test_groups_rows_into_ordered_slices() {
        let mut feed = CsvReplayFeed::from_reader(SAMPLE.as_bytes(), ReplayWindow::default()).unwrap();
        assert_eq!(feed.total(), 3);

        let first = feed.next_slice().await.unwrap().unwrap();
        assert_eq!(first.timestamp, parse_timestamp("2022-01-03").unwrap());
        assert_eq!(first.price(&Instrument::from("KO")), Some(59.3));
        assert_eq!(first.price(&Instrument::from("PEP")), Some(173.1));

        let second = feed.next_slice().await.unwrap().unwrap();
        assert_eq!(second.price(&Instrument::from("KO")), Some(59.9));

        // PEP has no row on the 5th
        let third = feed.next_slice().await.unwrap().unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third.price(&Instrument::from("PEP")), None);

        assert!(feed.next_slice().await.unwrap().is_none());
    }

    #[test]
    fn test_date_window_filter() {
        let window = ReplayWindow::new(
            NaiveDate::from_ymd_opt(2022, 1, 4),
            NaiveDate::from_ymd_opt(2022, 1, 4),
        );
        let feed = CsvReplayFeed::from_reader(SAMPLE.as_bytes(), window).unwrap();
        assert_eq!(feed.total(), 1);
        assert_eq!(feed.remaining(), 1);
    }

    #[test]
    fn test_rfc3339_timestamps() {
        let ts = parse_timestamp("2023-06-01T14:30:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-06-01T14:30:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_bad_price_reports_line() {
        let data = "timestamp,symbol,close\n2022-01-03,KO,abc\n";
        let err = CsvReplayFeed::from_reader(data.as_bytes(), ReplayWindow::default()).unwrap_err();
        match err {
            MarketDataError::ParseError(msg) => assert!(msg.starts_with("line 2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let feed = CsvReplayFeed::from_path(file.path(), ReplayWindow::default()).unwrap();
        assert_eq!(feed.total(), 3);

        let missing = CsvReplayFeed::from_path("/nonexistent/prices.csv", ReplayWindow::default());
        assert!(matches!(missing, Err(MarketDataError::SourceError(_))));
    }
}
