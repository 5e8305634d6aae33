//! Strategy Layer - Pairs spread z-score signals
//!
//! Implements the log-spread mean reversion engine:
//! - Rolling price windows per instrument
//! - Spread z-score over the lookback window
//! - Static or adaptive entry thresholds
//! - Per-pair position state machine
//!
//! The engine is synchronous and does no I/O; the application layer feeds it
//! one price slice per cycle and routes its decisions to execution.

pub mod engine;
pub mod params;
pub mod price_window;
pub mod spread;
pub mod threshold;

pub use engine::{CycleReport, PairDecision, SignalEngine, SkipReason};
pub use params::{ConfigError, EngineConfig, HistoryScope};
pub use price_window::{PriceWindow, WindowError};
pub use spread::{NoSignal, SpreadStatistics, ZScoreResult};
pub use threshold::{HistoryBook, Threshold, ThresholdPolicy, ZScoreHistory};
