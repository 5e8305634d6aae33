use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::Instrument;

/// Latest prices delivered for one observation cycle.
/// Instruments without an update this cycle are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSlice {
    pub timestamp: DateTime<Utc>,
    pub prices: HashMap<Instrument, f64>,
}

impl PriceSlice {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            prices: HashMap::new(),
        }
    }

    /// Builder: add or replace a price
    pub fn with_price(mut self, instrument: impl Into<Instrument>, price: f64) -> Self {
        self.prices.insert(instrument.into(), price);
        self
    }

    pub fn insert(&mut self, instrument: Instrument, price: f64) {
        self.prices.insert(instrument, price);
    }

    pub fn price(&self, instrument: &Instrument) -> Option<f64> {
        self.prices.get(instrument).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
