//! Spread Statistics
//!
//! Z-score of the log-price spread between two aligned windows.
//!
//! spread[i] = ln(price_a[i] / price_b[i])
//! z         = (spread[L-1] - mean(spread)) / population_std(spread)
//!
//! The z-score uses the newest spread sample against the whole window.

use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;

use crate::strategy::price_window::PriceWindow;

/// Standard deviation at or below this is treated as a flat spread
pub const MIN_STD_DEV: f64 = 1e-12;

/// Result of a spread z-score calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZScoreResult {
    /// Z-score of the newest spread sample
    pub value: f64,
    /// Mean of the spread window
    pub mean: f64,
    /// Population standard deviation of the spread window
    pub std_dev: f64,
}

/// Why a pair produced no z-score this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoSignal {
    #[error("Insufficient data: {have} of {need} samples")]
    InsufficientData { have: usize, need: usize },
    #[error("Zero variance: spread is flat across the window")]
    ZeroVariance,
}

/// Stateless spread calculator
pub struct SpreadStatistics;

impl SpreadStatistics {
    /// Compute the spread z-score from two full, lockstep windows
    pub fn compute(window_a: &PriceWindow, window_b: &PriceWindow) -> Result<ZScoreResult, NoSignal> {
        if !window_a.is_full() || !window_b.is_full() {
            return Err(NoSignal::InsufficientData {
                have: window_a.len().min(window_b.len()),
                need: window_a.capacity().max(window_b.capacity()),
            });
        }

        let spread = Self::log_spread(window_a, window_b);
        let latest = match spread.last() {
            Some(&s) => s,
            None => return Err(NoSignal::InsufficientData { have: 0, need: window_a.capacity() }),
        };

        let mean = spread.iter().mean();
        let std_dev = spread.iter().population_std_dev();

        // Avoid division by zero
        if std_dev.is_nan() || std_dev <= MIN_STD_DEV {
            return Err(NoSignal::ZeroVariance);
        }

        Ok(ZScoreResult {
            value: (latest - mean) / std_dev,
            mean,
            std_dev,
        })
    }

    /// Elementwise ln(a/b), oldest first
    pub fn log_spread(window_a: &PriceWindow, window_b: &PriceWindow) -> Vec<f64> {
        window_a
            .iter()
            .zip(window_b.iter())
            .map(|(a, b)| (a / b).ln())
            .collect()
    }
}
