use async_trait::async_trait;
use thiserror::Error;

use crate::domain::PriceSlice;

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Data source error: {0}")]
    SourceError(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),
}

/// Market data port trait
///
/// Delivers one slice of latest prices per call. Slices are consumed strictly
/// in order; the caller finishes a cycle before asking for the next.
#[async_trait]
pub trait MarketDataPort: Send {
    /// Next slice, or None once the feed is exhausted
    async fn next_slice(&mut self) -> Result<Option<PriceSlice>, MarketDataError>;
}
