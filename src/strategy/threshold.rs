//! Threshold Policy
//!
//! Entry/exit z-score thresholds, either fixed or derived from the
//! distribution of recent z-scores. History is owned by the caller and
//! passed in explicitly; the policy itself holds no state.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{HashMap, VecDeque};

use crate::domain::Pair;
use crate::strategy::params::HistoryScope;

/// Static entry trigger
pub const DEFAULT_ENTRY_THRESHOLD: f64 = 1.0;

/// Static lower exit band
pub const DEFAULT_EXIT_THRESHOLD: f64 = -1.0;

/// Entry trigger and lower exit band for one decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub entry: f64,
    pub exit_low: f64,
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            entry: DEFAULT_ENTRY_THRESHOLD,
            exit_low: DEFAULT_EXIT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// entry = 1.0, exit_low = -1.0
    #[default]
    Static,
    /// entry = mean + std, exit_low = mean - std of the z-score history
    Adaptive,
}

impl ThresholdPolicy {
    pub fn threshold_for(&self, history: &ZScoreHistory) -> Threshold {
        match self {
            ThresholdPolicy::Static => Threshold::default(),
            ThresholdPolicy::Adaptive => {
                // Never stall waiting for history to accumulate
                if history.is_empty() {
                    return Threshold::default();
                }
                let mean = history.iter().mean();
                let std_dev = history.iter().population_std_dev();
                Threshold {
                    entry: mean + std_dev,
                    exit_low: mean - std_dev,
                }
            }
        }
    }
}

/// Recent z-scores, oldest first, optionally capped
#[derive(Debug, Clone, Default)]
pub struct ZScoreHistory {
    values: VecDeque<f64>,
    cap: Option<usize>,
}

impl ZScoreHistory {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            values: VecDeque::new(),
            cap,
        }
    }

    pub fn push(&mut self, z_score: f64) {
        self.values.push_back(z_score);
        if let Some(cap) = self.cap {
            while self.values.len() > cap {
                self.values.pop_front();
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<f64> for ZScoreHistory {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
            cap: None,
        }
    }
}

/// Z-score histories keyed by the configured scope
#[derive(Debug, Clone)]
pub enum HistoryBook {
    Shared(ZScoreHistory),
    PerPair {
        histories: HashMap<Pair, ZScoreHistory>,
        cap: Option<usize>,
    },
}

impl HistoryBook {
    pub fn new(scope: HistoryScope, cap: Option<usize>) -> Self {
        match scope {
            HistoryScope::Shared => HistoryBook::Shared(ZScoreHistory::new(cap)),
            HistoryScope::PerPair => HistoryBook::PerPair {
                histories: HashMap::new(),
                cap,
            },
        }
    }

    /// History visible to a pair. Per-pair histories start empty.
    pub fn history_for(&self, pair: &Pair) -> Option<&ZScoreHistory> {
        match self {
            HistoryBook::Shared(history) => Some(history),
            HistoryBook::PerPair { histories, .. } => histories.get(pair),
        }
    }

    pub fn record(&mut self, pair: &Pair, z_score: f64) {
        match self {
            HistoryBook::Shared(history) => history.push(z_score),
            HistoryBook::PerPair { histories, cap } => histories
                .entry(pair.clone())
                .or_insert_with(|| ZScoreHistory::new(*cap))
                .push(z_score),
        }
    }

    /// Threshold for a pair under the given policy
    pub fn threshold_for(&self, policy: ThresholdPolicy, pair: &Pair) -> Threshold {
        match self.history_for(pair) {
            Some(history) => policy.threshold_for(history),
            None => policy.threshold_for(&ZScoreHistory::default()),
        }
    }

    pub fn len_for(&self, pair: &Pair) -> usize {
        self.history_for(pair).map_or(0, ZScoreHistory::len)
    }
}
