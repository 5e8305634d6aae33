//! Price Window
//!
//! Fixed-capacity FIFO of recent prices for a single instrument.

use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WindowError {
    /// Log-spread needs strictly positive, finite prices
    #[error("Invalid price: {0} (must be finite and > 0)")]
    InvalidInput(f64),
}

/// Rolling price buffer, oldest at the front
#[derive(Debug, Clone)]
pub struct PriceWindow {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl PriceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            prices: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Check a price without touching the buffer
    pub fn validate(price: f64) -> Result<(), WindowError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(WindowError::InvalidInput(price));
        }
        Ok(())
    }

    /// Append a price, evicting the oldest once over capacity.
    /// Rejected prices leave the window unchanged.
    pub fn append(&mut self, price: f64) -> Result<(), WindowError> {
        Self::validate(price)?;

        self.prices.push_back(price);
        if self.prices.len() > self.capacity {
            self.prices.pop_front();
        }
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.prices.len() == self.capacity
    }

    /// Oldest-to-newest snapshot
    pub fn values(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> + '_ {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
