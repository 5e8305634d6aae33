//! Engine Parameters
//!
//! Configuration for the pairs signal engine. Defaults mirror the
//! multi-pair reference setup: 20-sample lookback, static thresholds,
//! 1.5 weight per leg.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{Instrument, Pair};
use crate::strategy::threshold::ThresholdPolicy;

/// Default number of samples per price window
pub const DEFAULT_LOOKBACK: usize = 20;

/// Smallest lookback that can produce a non-zero spread deviation
pub const MIN_LOOKBACK: usize = 1;

/// Default target weight per leg when a position is entered
pub const DEFAULT_ENTRY_WEIGHT_PER_LEG: f64 = 1.5;

/// Which pairs contribute to the z-score history read by the adaptive threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryScope {
    /// One history accumulated across every pair
    #[default]
    Shared,
    /// Each pair reads only its own z-scores
    PerPair,
}

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Samples retained per instrument window (L)
    pub lookback: usize,
    /// Static or adaptive entry/exit thresholds
    pub threshold_policy: ThresholdPolicy,
    /// Scope of the adaptive threshold history
    pub history_scope: HistoryScope,
    /// Maximum z-scores kept per history; None keeps everything
    pub history_cap: Option<usize>,
    /// Configured pairs, processed in this order every cycle
    pub pairs: Vec<Pair>,
    /// Target weight magnitude for each leg on entry
    pub entry_weight_per_leg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            threshold_policy: ThresholdPolicy::Static,
            history_scope: HistoryScope::Shared,
            history_cap: None,
            pairs: Vec::new(),
            entry_weight_per_leg: DEFAULT_ENTRY_WEIGHT_PER_LEG,
        }
    }
}

impl EngineConfig {
    /// Create a config for the given pairs with default parameters
    pub fn new(pairs: Vec<Pair>) -> Self {
        Self {
            pairs,
            ..Default::default()
        }
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_threshold_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.threshold_policy = policy;
        self
    }

    pub fn with_history_scope(mut self, scope: HistoryScope) -> Self {
        self.history_scope = scope;
        self
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = Some(cap);
        self
    }

    pub fn with_entry_weight(mut self, weight: f64) -> Self {
        self.entry_weight_per_leg = weight;
        self
    }

    /// Every instrument referenced by a pair, in configuration order
    pub fn instruments(&self) -> Vec<Instrument> {
        self.pairs
            .iter()
            .flat_map(|p| [p.leg_a.clone(), p.leg_b.clone()])
            .collect()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback < MIN_LOOKBACK {
            return Err(ConfigError::InvalidLookback(self.lookback));
        }
        if self.pairs.is_empty() {
            return Err(ConfigError::NoPairs);
        }
        if !self.entry_weight_per_leg.is_finite() || self.entry_weight_per_leg <= 0.0 {
            return Err(ConfigError::InvalidWeight(self.entry_weight_per_leg));
        }
        if self.history_cap == Some(0) {
            return Err(ConfigError::InvalidHistoryCap);
        }

        // Legs must be disjoint across pairs so a skipped pair never
        // advances a window another pair depends on.
        let mut seen: HashSet<&Instrument> = HashSet::new();
        for pair in &self.pairs {
            if pair.leg_a == pair.leg_b {
                return Err(ConfigError::IdenticalLegs(pair.leg_a.to_string()));
            }
            for leg in pair.legs() {
                if !seen.insert(leg) {
                    return Err(ConfigError::SharedInstrument(leg.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid lookback: {0} (must be at least 1)")]
    InvalidLookback(usize),
    #[error("No pairs configured")]
    NoPairs,
    #[error("Pair uses {0} for both legs")]
    IdenticalLegs(String),
    #[error("Instrument {0} appears in more than one pair; a shared leg would break leg lockstep")]
    SharedInstrument(String),
    #[error("Invalid entry weight per leg: {0} (must be finite and > 0)")]
    InvalidWeight(f64),
    #[error("History cap must be at least 1")]
    InvalidHistoryCap,
}
