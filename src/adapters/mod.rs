//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: CSV replay of historical closes
//! - Execution: paper account driven by target weights
//! - Diagnostics: JSON-lines z-score writer
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod diagnostics;
pub mod execution;
pub mod market_data;

pub use cli::CliApp;
pub use diagnostics::JsonlDiagnostics;
pub use execution::PaperExecution;
pub use market_data::CsvReplayFeed;
