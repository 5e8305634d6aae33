//! Paper Execution
//!
//! Simulated account that realizes target allocations without a broker.
//! Each leg is set to `weight * equity / price` units at the last mark,
//! so a weight of -1.5 holds a short worth 150% of equity. No fees or
//! slippage are modeled.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::{Instrument, PriceSlice};
use crate::ports::execution::{ExecutionError, ExecutionPort, TargetAllocation};

/// Default starting cash
pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

/// Quantity changes smaller than this are not traded
const MIN_FILL_QUANTITY: f64 = 1e-9;

/// A single simulated fill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperFill {
    pub instrument: Instrument,
    /// Signed quantity traded (negative = sell)
    pub quantity: f64,
    pub price: f64,
}

/// Running account statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaperStats {
    pub fills: u32,
    pub allocations: u32,
    pub liquidations: u32,
    pub peak_equity: f64,
    pub max_drawdown_pct: f64,
}

/// End-of-run account summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperSummary {
    pub initial_cash: f64,
    pub final_equity: f64,
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
    pub fills: u32,
    pub open_positions: usize,
}

/// Paper trading account
#[derive(Debug, Clone)]
pub struct PaperExecution {
    initial_cash: f64,
    cash: f64,
    positions: HashMap<Instrument, f64>,
    marks: HashMap<Instrument, f64>,
    fills: Vec<PaperFill>,
    stats: PaperStats,
}

impl PaperExecution {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            positions: HashMap::new(),
            marks: HashMap::new(),
            fills: Vec::new(),
            stats: PaperStats {
                peak_equity: initial_cash,
                ..Default::default()
            },
        }
    }

    /// Cash plus marked value of every position
    pub fn equity(&self) -> f64 {
        let holdings: f64 = self
            .positions
            .iter()
            .map(|(instrument, qty)| qty * self.marks.get(instrument).copied().unwrap_or(0.0))
            .sum();
        self.cash + holdings
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, instrument: &Instrument) -> f64 {
        self.positions.get(instrument).copied().unwrap_or(0.0)
    }

    /// Position value as a fraction of equity
    pub fn weight(&self, instrument: &Instrument) -> f64 {
        let equity = self.equity();
        if equity == 0.0 {
            return 0.0;
        }
        let price = self.marks.get(instrument).copied().unwrap_or(0.0);
        self.position(instrument) * price / equity
    }

    pub fn fills(&self) -> &[PaperFill] {
        &self.fills
    }

    pub fn stats(&self) -> &PaperStats {
        &self.stats
    }

    pub fn summary(&self) -> PaperSummary {
        let final_equity = self.equity();
        let return_pct = if self.initial_cash > 0.0 {
            (final_equity / self.initial_cash - 1.0) * 100.0
        } else {
            0.0
        };
        PaperSummary {
            initial_cash: self.initial_cash,
            final_equity,
            return_pct,
            max_drawdown_pct: self.stats.max_drawdown_pct,
            fills: self.stats.fills,
            open_positions: self.positions.values().filter(|q| q.abs() > MIN_FILL_QUANTITY).count(),
        }
    }

    fn mark_price(&self, instrument: &Instrument) -> Result<f64, ExecutionError> {
        self.marks
            .get(instrument)
            .copied()
            .ok_or_else(|| ExecutionError::MissingPrice(instrument.clone()))
    }

    /// Trade one instrument to a target weight of the given equity
    fn set_holdings(&mut self, instrument: &Instrument, weight: f64, equity: f64) -> Result<(), ExecutionError> {
        let price = self.mark_price(instrument)?;
        let target = weight * equity / price;
        let delta = target - self.position(instrument);
        if delta.abs() < MIN_FILL_QUANTITY {
            return Ok(());
        }

        self.cash -= delta * price;
        self.positions.insert(instrument.clone(), target);
        self.fills.push(PaperFill {
            instrument: instrument.clone(),
            quantity: delta,
            price,
        });
        self.stats.fills += 1;
        debug!("PAPER FILL - {} {:+.4} @ {:.4}", instrument, delta, price);
        Ok(())
    }

    fn update_drawdown(&mut self) {
        let equity = self.equity();
        if equity > self.stats.peak_equity {
            self.stats.peak_equity = equity;
        } else if self.stats.peak_equity > 0.0 {
            let drawdown = (self.stats.peak_equity - equity) / self.stats.peak_equity * 100.0;
            self.stats.max_drawdown_pct = self.stats.max_drawdown_pct.max(drawdown);
        }
    }
}

impl Default for PaperExecution {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CASH)
    }
}

#[async_trait]
impl ExecutionPort for PaperExecution {
    async fn on_market(&mut self, slice: &PriceSlice) -> Result<(), ExecutionError> {
        for (instrument, &price) in &slice.prices {
            // Bad ticks never become marks
            if price.is_finite() && price > 0.0 {
                self.marks.insert(instrument.clone(), price);
            }
        }
        self.update_drawdown();
        Ok(())
    }

    async fn apply(&mut self, allocation: &TargetAllocation) -> Result<(), ExecutionError> {
        if !allocation.weight_a.is_finite() || !allocation.weight_b.is_finite() {
            return Err(ExecutionError::InvalidParameters(format!(
                "non-finite weights for {}",
                allocation.pair
            )));
        }
        // Both legs must be priceable before either trades
        self.mark_price(&allocation.pair.leg_a)?;
        self.mark_price(&allocation.pair.leg_b)?;

        let equity = self.equity();
        let fills_before = self.stats.fills;
        self.set_holdings(&allocation.pair.leg_a, allocation.weight_a, equity)?;
        self.set_holdings(&allocation.pair.leg_b, allocation.weight_b, equity)?;

        self.stats.allocations += 1;
        if allocation.is_liquidation() && self.stats.fills > fills_before {
            self.stats.liquidations += 1;
        }
        if self.stats.fills > fills_before {
            info!(
                "PAPER TRADE - {} {} | weights {:+.2}/{:+.2} | equity ${:.2}",
                allocation.pair, allocation.decision, allocation.weight_a, allocation.weight_b, equity
            );
        }
        Ok(())
    }
}
