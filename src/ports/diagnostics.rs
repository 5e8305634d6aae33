use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::Decision;
use crate::strategy::PairDecision;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("Failed to write diagnostics: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to serialize diagnostics: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One pair's statistics for one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreObservation {
    pub timestamp: DateTime<Utc>,
    pub pair: String,
    pub z_score: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub entry: f64,
    pub exit_low: f64,
    pub decision: Decision,
    /// Normal CDF of |z|
    pub confidence: f64,
}

impl ZScoreObservation {
    pub fn new(timestamp: DateTime<Utc>, pair_decision: &PairDecision) -> Self {
        Self {
            timestamp,
            pair: pair_decision.pair.to_string(),
            z_score: pair_decision.zscore.value,
            mean: pair_decision.zscore.mean,
            std_dev: pair_decision.zscore.std_dev,
            entry: pair_decision.threshold.entry,
            exit_low: pair_decision.threshold.exit_low,
            decision: pair_decision.decision,
            confidence: pair_decision.decision.confidence(),
        }
    }
}

/// Optional sink for per-cycle signal diagnostics
pub trait DiagnosticsPort: Send {
    fn record(&mut self, observation: &ZScoreObservation) -> Result<(), DiagnosticsError>;

    fn flush(&mut self) -> Result<(), DiagnosticsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pair;
    use crate::strategy::{Threshold, ZScoreResult};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn test_observation_from_decision() {
        let pair_decision = PairDecision {
            pair: Pair::new("BAC", "JPM"),
            decision: Decision::LongAShortB { z_score: -2.0 },
            zscore: ZScoreResult { value: -2.0, mean: -1.5, std_dev: 0.01 },
            threshold: Threshold::default(),
        };
        let timestamp = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();

        let observation = ZScoreObservation::new(timestamp, &pair_decision);
        assert_eq!(observation.pair, "BAC/JPM");
        assert_eq!(observation.z_score, -2.0);
        assert_eq!(observation.mean, -1.5);
        assert_eq!((observation.entry, observation.exit_low), (1.0, -1.0));
        // Phi(2)
        assert_relative_eq!(observation.confidence, 0.9772, epsilon = 1e-4);
    }
}
