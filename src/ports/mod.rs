//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Market data feeds (one price slice per cycle)
//! - Execution (target weights per pair leg)
//! - Diagnostics sinks (per-cycle z-score observations)

pub mod diagnostics;
pub mod execution;
pub mod market_data;
pub mod mocks;

pub use diagnostics::{DiagnosticsError, DiagnosticsPort, ZScoreObservation};
pub use execution::{ExecutionError, ExecutionPort, TargetAllocation};
pub use market_data::{MarketDataError, MarketDataPort};
