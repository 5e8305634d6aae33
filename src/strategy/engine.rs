//! Signal Engine
//!
//! Owns every price window, pair state and z-score history. One call to
//! `on_slice` is one observation cycle over all configured pairs:
//!
//! 1. Append both legs (or neither) to their windows
//! 2. Compute the spread z-score
//! 3. Look up the entry threshold from the pair's history
//! 4. Decide: z > entry -> short A/long B, z < -entry -> long A/short B, else flat
//! 5. Record z in the history
//!
//! Nothing in a cycle is fatal; a pair that cannot be evaluated is skipped
//! and picked up again next cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::domain::{Decision, Instrument, Pair, PairState, PriceSlice};
use crate::strategy::params::{ConfigError, EngineConfig};
use crate::strategy::price_window::PriceWindow;
use crate::strategy::spread::{NoSignal, SpreadStatistics, ZScoreResult};
use crate::strategy::threshold::{HistoryBook, Threshold};

/// Decision for one pair with the statistics behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairDecision {
    pub pair: Pair,
    pub decision: Decision,
    pub zscore: ZScoreResult,
    pub threshold: Threshold,
}

/// Why a pair emitted nothing this cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A leg had no price in the slice; neither window was touched
    MissingPrice(Instrument),
    /// A leg's price was rejected; neither window was touched
    InvalidPrice { instrument: Instrument, price: f64 },
    /// Windows advanced but no z-score is defined
    NoSignal(NoSignal),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingPrice(instrument) => write!(f, "missing price for {}", instrument),
            SkipReason::InvalidPrice { instrument, price } => {
                write!(f, "invalid price {} for {}", price, instrument)
            }
            SkipReason::NoSignal(reason) => write!(f, "{}", reason),
        }
    }
}

/// Everything one cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub decisions: Vec<PairDecision>,
    pub skipped: Vec<(Pair, SkipReason)>,
}

impl CycleReport {
    pub fn decision_for(&self, pair: &Pair) -> Option<&PairDecision> {
        self.decisions.iter().find(|d| &d.pair == pair)
    }

    pub fn skip_reason_for(&self, pair: &Pair) -> Option<&SkipReason> {
        self.skipped.iter().find(|(p, _)| p == pair).map(|(_, reason)| reason)
    }
}

/// Pairs-trading signal engine
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
    windows: HashMap<Instrument, PriceWindow>,
    states: HashMap<Pair, PairState>,
    history: HistoryBook,
    cycles: u64,
}

impl SignalEngine {
    /// Build an engine. Malformed configuration prevents startup.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let windows = config
            .instruments()
            .into_iter()
            .map(|instrument| (instrument, PriceWindow::new(config.lookback)))
            .collect();
        let states = config
            .pairs
            .iter()
            .map(|pair| (pair.clone(), PairState::Flat))
            .collect();
        let history = HistoryBook::new(config.history_scope, config.history_cap);

        tracing::info!(
            "Signal engine ready - {} pairs, lookback {}, {:?} thresholds, {:?} history",
            config.pairs.len(),
            config.lookback,
            config.threshold_policy,
            config.history_scope
        );

        Ok(Self {
            config,
            windows,
            states,
            history,
            cycles: 0,
        })
    }

    /// Run one observation cycle over every configured pair
    pub fn on_slice(&mut self, slice: &PriceSlice) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport {
            timestamp: slice.timestamp,
            decisions: Vec::new(),
            skipped: Vec::new(),
        };
        let mut z_scores: BTreeMap<String, f64> = BTreeMap::new();

        let pairs = self.config.pairs.clone();
        for pair in pairs {
            match self.evaluate(&pair, slice) {
                Ok(pair_decision) => {
                    z_scores.insert(pair.to_string(), pair_decision.zscore.value);
                    report.decisions.push(pair_decision);
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::InvalidPrice { instrument, price } => {
                            tracing::warn!("{} skipped: invalid price {} for {}", pair, price, instrument);
                        }
                        SkipReason::NoSignal(NoSignal::ZeroVariance) => {
                            tracing::info!("{} skipped: flat spread, no signal", pair);
                        }
                        other => tracing::trace!("{} skipped: {}", pair, other),
                    }
                    report.skipped.push((pair, reason));
                }
            }
        }

        tracing::debug!("Z-scores: {:?}", z_scores);
        report
    }

    /// Steps 1-5 for a single pair
    fn evaluate(&mut self, pair: &Pair, slice: &PriceSlice) -> Result<PairDecision, SkipReason> {
        self.advance_windows(pair, slice)?;

        let zscore = self.zscore(pair).map_err(SkipReason::NoSignal)?;
        let threshold = self.threshold_for(pair);
        let decision = Self::decide(zscore.value, &threshold);

        self.states.insert(pair.clone(), decision.resulting_state());
        self.history.record(pair, zscore.value);

        match decision {
            Decision::ShortALongB { z_score } => {
                tracing::info!("short {} long {} zscore {:.4}", pair.leg_a, pair.leg_b, z_score)
            }
            Decision::LongAShortB { z_score } => {
                tracing::info!("long {} short {} zscore {:.4}", pair.leg_a, pair.leg_b, z_score)
            }
            Decision::Flat { z_score } => {
                tracing::info!("Liquidating {}, {} zscore {:.4}", pair.leg_a, pair.leg_b, z_score)
            }
        }

        Ok(PairDecision {
            pair: pair.clone(),
            decision,
            zscore,
            threshold,
        })
    }

    /// Append both legs or neither, so window indices stay aligned
    fn advance_windows(&mut self, pair: &Pair, slice: &PriceSlice) -> Result<(), SkipReason> {
        let price_a = slice
            .price(&pair.leg_a)
            .ok_or_else(|| SkipReason::MissingPrice(pair.leg_a.clone()))?;
        let price_b = slice
            .price(&pair.leg_b)
            .ok_or_else(|| SkipReason::MissingPrice(pair.leg_b.clone()))?;

        for (instrument, price) in [(&pair.leg_a, price_a), (&pair.leg_b, price_b)] {
            if PriceWindow::validate(price).is_err() {
                return Err(SkipReason::InvalidPrice {
                    instrument: instrument.clone(),
                    price,
                });
            }
        }

        for (instrument, price) in [(&pair.leg_a, price_a), (&pair.leg_b, price_b)] {
            if let Some(window) = self.windows.get_mut(instrument) {
                window
                    .append(price)
                    .map_err(|_| SkipReason::InvalidPrice {
                        instrument: instrument.clone(),
                        price,
                    })?;
            }
        }
        Ok(())
    }

    /// Decision rule. Strict comparisons: z == entry is flat.
    /// Only the entry magnitude splits entry from liquidation; `exit_low`
    /// is carried for diagnostics but not consulted.
    pub fn decide(z_score: f64, threshold: &Threshold) -> Decision {
        if z_score > threshold.entry {
            Decision::ShortALongB { z_score }
        } else if z_score < -threshold.entry {
            Decision::LongAShortB { z_score }
        } else {
            Decision::Flat { z_score }
        }
    }

    /// Current spread z-score for a pair without advancing anything
    pub fn zscore(&self, pair: &Pair) -> Result<ZScoreResult, NoSignal> {
        match (self.windows.get(&pair.leg_a), self.windows.get(&pair.leg_b)) {
            (Some(a), Some(b)) => SpreadStatistics::compute(a, b),
            _ => Err(NoSignal::InsufficientData {
                have: 0,
                need: self.config.lookback,
            }),
        }
    }

    /// Threshold the pair would be judged against right now
    pub fn threshold_for(&self, pair: &Pair) -> Threshold {
        self.history.threshold_for(self.config.threshold_policy, pair)
    }

    pub fn state(&self, pair: &Pair) -> Option<PairState> {
        self.states.get(pair).copied()
    }

    pub fn window(&self, instrument: &Instrument) -> Option<&PriceWindow> {
        self.windows.get(instrument)
    }

    pub fn history_len(&self, pair: &Pair) -> usize {
        self.history.len_for(pair)
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.config.pairs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cycles processed so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// True once every pair has a full window on both legs
    pub fn is_ready(&self) -> bool {
        self.windows.values().all(PriceWindow::is_full)
    }
}
