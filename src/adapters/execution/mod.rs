//! Execution Adapters
//!
//! - `paper`: simulated account with set-holdings / liquidate semantics

pub mod paper;

pub use paper::{PaperExecution, PaperFill, PaperStats, PaperSummary, DEFAULT_INITIAL_CASH};
