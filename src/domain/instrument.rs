use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque instrument identifier (ticker symbol)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instrument {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<String> for Instrument {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}

/// Ordered pair of instruments forming a spread: ln(leg_a / leg_b)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub leg_a: Instrument,
    pub leg_b: Instrument,
}

impl Pair {
    pub fn new(leg_a: impl Into<Instrument>, leg_b: impl Into<Instrument>) -> Self {
        Self {
            leg_a: leg_a.into(),
            leg_b: leg_b.into(),
        }
    }

    /// Both legs, A first
    pub fn legs(&self) -> [&Instrument; 2] {
        [&self.leg_a, &self.leg_b]
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.leg_a, self.leg_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_pair_display() {
        let pair = Pair::new("KO", "PEP");
        assert_eq!(pair.to_string(), "KO/PEP");
        assert_eq!(pair.legs(), [&Instrument::from("KO"), &Instrument::from("PEP")]);
    }

    #[test]
    fn test_pair_order_matters() {
        assert_ne!(Pair::new("KO", "PEP"), Pair::new("PEP", "KO"));
    }

    #[test]
    fn test_instrument_as_map_key() {
        let mut prices = HashMap::new();
        prices.insert(Instrument::from("AAPL"), 150.0);
        assert_eq!(prices.get(&Instrument::new("AAPL".to_string())), Some(&150.0));
    }

    #[test]
    fn test_instrument_serializes_as_plain_string() {
        let json = serde_json::to_string(&Instrument::from("MSFT")).unwrap();
        assert_eq!(json, "\"MSFT\"");
    }
}
