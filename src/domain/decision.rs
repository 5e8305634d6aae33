use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading decision for one pair in one cycle, tagged with the z-score that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Spread is rich: short leg A, long leg B
    ShortALongB { z_score: f64 },
    /// Spread is cheap: long leg A, short leg B
    LongAShortB { z_score: f64 },
    /// No extreme divergence: hold nothing in either leg
    Flat { z_score: f64 },
}

impl Decision {
    pub fn z_score(&self) -> f64 {
        match *self {
            Decision::ShortALongB { z_score }
            | Decision::LongAShortB { z_score }
            | Decision::Flat { z_score } => z_score,
        }
    }

    /// Target portfolio weights (leg A, leg B) for a per-leg sizing weight.
    /// Negative weight is a short.
    pub fn target_weights(&self, weight_per_leg: f64) -> (f64, f64) {
        match self {
            Decision::ShortALongB { .. } => (-weight_per_leg, weight_per_leg),
            Decision::LongAShortB { .. } => (weight_per_leg, -weight_per_leg),
            Decision::Flat { .. } => (0.0, 0.0),
        }
    }

    /// Position state this decision moves the pair into
    pub fn resulting_state(&self) -> PairState {
        match self {
            Decision::ShortALongB { .. } => PairState::ShortALongB,
            Decision::LongAShortB { .. } => PairState::LongAShortB,
            Decision::Flat { .. } => PairState::Flat,
        }
    }

    /// Standard normal CDF of |z|, 0.5 at the mean
    pub fn confidence(&self) -> f64 {
        use statrs::function::erf::erf;
        0.5 * (1.0 + erf(self.z_score().abs() / f64::sqrt(2.0)))
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Decision::Flat { .. })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::ShortALongB { z_score } => write!(f, "SHORT_A_LONG_B (z={:.3})", z_score),
            Decision::LongAShortB { z_score } => write!(f, "LONG_A_SHORT_B (z={:.3})", z_score),
            Decision::Flat { z_score } => write!(f, "FLAT (z={:.3})", z_score),
        }
    }
}

/// Per-pair position state. No terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    #[default]
    Flat,
    ShortALongB,
    LongAShortB,
}

impl fmt::Display for PairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairState::Flat => write!(f, "FLAT"),
            PairState::ShortALongB => write!(f, "SHORT_A_LONG_B"),
            PairState::LongAShortB => write!(f, "LONG_A_SHORT_B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_target_weights() {
        let w = 1.5;
        assert_eq!(Decision::ShortALongB { z_score: 1.2 }.target_weights(w), (-1.5, 1.5));
        assert_eq!(Decision::LongAShortB { z_score: -1.2 }.target_weights(w), (1.5, -1.5));
        assert_eq!(Decision::Flat { z_score: 0.3 }.target_weights(w), (0.0, 0.0));
    }

    #[test]
    fn test_resulting_state() {
        assert_eq!(Decision::ShortALongB { z_score: 2.0 }.resulting_state(), PairState::ShortALongB);
        assert_eq!(Decision::LongAShortB { z_score: -2.0 }.resulting_state(), PairState::LongAShortB);
        assert_eq!(Decision::Flat { z_score: 0.0 }.resulting_state(), PairState::Flat);
        assert_eq!(PairState::default(), PairState::Flat);
    }

    #[test]
    fn test_confidence_is_symmetric() {
        let rich = Decision::ShortALongB { z_score: 2.0 };
        let cheap = Decision::LongAShortB { z_score: -2.0 };
        assert_relative_eq!(rich.confidence(), 0.977, epsilon = 0.001);
        assert_relative_eq!(rich.confidence(), cheap.confidence());
        assert_relative_eq!(Decision::Flat { z_score: 0.0 }.confidence(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_string(&Decision::Flat { z_score: 0.5 }).unwrap();
        assert_eq!(json, r#"{"kind":"flat","z_score":0.5}"#);
    }
}
