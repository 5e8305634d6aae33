use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Decision, Instrument, Pair, PriceSlice};
use crate::strategy::PairDecision;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Allocation rejected: {0}")]
    Rejected(String),
    #[error("No mark price for {0}")]
    MissingPrice(Instrument),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Target position for both legs of a pair, as fractions of equity.
/// Negative weight is a short; zero on both legs liquidates the pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAllocation {
    pub timestamp: DateTime<Utc>,
    pub pair: Pair,
    pub decision: Decision,
    pub weight_a: f64,
    pub weight_b: f64,
}

impl TargetAllocation {
    pub fn from_decision(
        timestamp: DateTime<Utc>,
        pair_decision: &PairDecision,
        weight_per_leg: f64,
    ) -> Self {
        let (weight_a, weight_b) = pair_decision.decision.target_weights(weight_per_leg);
        Self {
            timestamp,
            pair: pair_decision.pair.clone(),
            decision: pair_decision.decision,
            weight_a,
            weight_b,
        }
    }

    pub fn is_liquidation(&self) -> bool {
        self.weight_a == 0.0 && self.weight_b == 0.0
    }
}

/// Execution port trait
///
/// Realizes engine decisions as position changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionPort: Send {
    /// Latest prices for the cycle, delivered before any allocation
    async fn on_market(&mut self, slice: &PriceSlice) -> Result<(), ExecutionError>;

    /// Move both legs of a pair to their target weights
    async fn apply(&mut self, allocation: &TargetAllocation) -> Result<(), ExecutionError>;
}
