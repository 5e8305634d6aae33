use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::domain::{Pair, PriceSlice};
use crate::ports::diagnostics::{DiagnosticsError, DiagnosticsPort, ZScoreObservation};
use crate::ports::execution::{ExecutionError, ExecutionPort, TargetAllocation};
use crate::ports::market_data::{MarketDataError, MarketDataPort};

/// In-memory market data feed that replays a fixed list of slices
#[derive(Debug, Default)]
pub struct MockMarketData {
    slices: VecDeque<PriceSlice>,
    fail_after: Option<usize>,
    served: usize,
}

impl MockMarketData {
    pub fn new(slices: Vec<PriceSlice>) -> Self {
        Self {
            slices: slices.into(),
            ..Default::default()
        }
    }

    /// Builder method to fail once `count` slices have been served
    pub fn with_failure_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn remaining(&self) -> usize {
        self.slices.len()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn next_slice(&mut self) -> Result<Option<PriceSlice>, MarketDataError> {
        if self.fail_after == Some(self.served) {
            return Err(MarketDataError::SourceError("feed disconnected".to_string()));
        }
        self.served += 1;
        Ok(self.slices.pop_front())
    }
}

/// Mock execution port that records allocations and can reject a pair
#[derive(Debug, Default, Clone)]
pub struct MockExecution {
    allocations: Arc<Mutex<Vec<TargetAllocation>>>,
    marks: Arc<Mutex<Vec<PriceSlice>>>,
    reject: Option<Pair>,
}

impl MockExecution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to reject every allocation for a pair
    pub fn with_rejection(mut self, pair: Pair) -> Self {
        self.reject = Some(pair);
        self
    }

    /// Get all recorded allocations
    pub fn get_allocations(&self) -> Vec<TargetAllocation> {
        self.allocations.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of slices marked
    pub fn mark_count(&self) -> usize {
        self.marks.lock().map(|m| m.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ExecutionPort for MockExecution {
    async fn on_market(&mut self, slice: &PriceSlice) -> Result<(), ExecutionError> {
        if let Ok(mut marks) = self.marks.lock() {
            marks.push(slice.clone());
        }
        Ok(())
    }

    async fn apply(&mut self, allocation: &TargetAllocation) -> Result<(), ExecutionError> {
        if self.reject.as_ref() == Some(&allocation.pair) {
            return Err(ExecutionError::Rejected(format!("{} not tradable", allocation.pair)));
        }
        if let Ok(mut allocations) = self.allocations.lock() {
            allocations.push(allocation.clone());
        }
        Ok(())
    }
}

/// Diagnostics sink that keeps observations in memory
#[derive(Debug, Default, Clone)]
pub struct MockDiagnostics {
    observations: Arc<Mutex<Vec<ZScoreObservation>>>,
}

impl MockDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_observations(&self) -> Vec<ZScoreObservation> {
        self.observations.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl DiagnosticsPort for MockDiagnostics {
    fn record(&mut self, observation: &ZScoreObservation) -> Result<(), DiagnosticsError> {
        if let Ok(mut observations) = self.observations.lock() {
            observations.push(observation.clone());
        }
        Ok(())
    }
}
