//! Signal Orchestrator
//!
//! Coordinates the pairs signal engine with market data and execution.
//! Main loop that pulls one price slice, runs one engine cycle, and
//! dispatches target allocations before asking for the next slice.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::domain::PairState;
use crate::ports::diagnostics::{DiagnosticsError, DiagnosticsPort, ZScoreObservation};
use crate::ports::execution::{ExecutionError, ExecutionPort, TargetAllocation};
use crate::ports::market_data::{MarketDataError, MarketDataPort};
use crate::strategy::{ConfigError, CycleReport, EngineConfig, SignalEngine};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Market data error: {0}")]
    MarketDataError(#[from] MarketDataError),
    #[error("Execution error: {0}")]
    ExecutionError(#[from] ExecutionError),
    #[error("Diagnostics error: {0}")]
    DiagnosticsError(#[from] DiagnosticsError),
}

/// Counters accumulated across cycles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCounters {
    pub cycles: u64,
    pub decisions: u64,
    pub entries: u64,
    pub flats: u64,
    pub skipped: u64,
    pub execution_failures: u64,
}

/// Status snapshot of the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub is_running: bool,
    pub is_ready: bool,
    pub counters: RunCounters,
    pub pair_states: Vec<(String, PairState)>,
}

type SharedDiagnostics = Arc<Mutex<Box<dyn DiagnosticsPort>>>;

/// Main orchestrator that coordinates engine, feed and execution
pub struct SignalOrchestrator<F: MarketDataPort, E: ExecutionPort> {
    engine: Arc<RwLock<SignalEngine>>,
    feed: Arc<Mutex<F>>,
    execution: Arc<Mutex<E>>,
    diagnostics: Option<SharedDiagnostics>,
    is_running: Arc<RwLock<bool>>,
    /// Set by `stop`; never cleared, so a stop sent before `run` still holds
    stop_requested: Arc<RwLock<bool>>,
    counters: Arc<RwLock<RunCounters>>,
    poll_interval: Duration,
}

impl<F: MarketDataPort, E: ExecutionPort> SignalOrchestrator<F, E> {
    /// Create new orchestrator. Fails if the engine configuration is malformed.
    pub fn new(config: EngineConfig, feed: F, execution: E) -> Result<Self, OrchestratorError> {
        let engine = SignalEngine::new(config)?;

        Ok(Self {
            engine: Arc::new(RwLock::new(engine)),
            feed: Arc::new(Mutex::new(feed)),
            execution: Arc::new(Mutex::new(execution)),
            diagnostics: None,
            is_running: Arc::new(RwLock::new(false)),
            stop_requested: Arc::new(RwLock::new(false)),
            counters: Arc::new(RwLock::new(RunCounters::default())),
            poll_interval: Duration::ZERO,
        })
    }

    /// Attach a diagnostics sink
    pub fn with_diagnostics(mut self, sink: impl DiagnosticsPort + 'static) -> Self {
        self.diagnostics = Some(Arc::new(Mutex::new(Box::new(sink))));
        self
    }

    /// Pause between cycles (zero for historical replay)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run until the feed is exhausted or `stop` is called
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        if *self.stop_requested.read().await {
            tracing::info!("Stop already requested, not starting");
            return Ok(());
        }
        *self.is_running.write().await = true;

        tracing::info!(
            "Starting signal orchestrator - Poll interval: {:?}",
            self.poll_interval
        );

        let result = loop {
            if *self.stop_requested.read().await {
                break Ok(());
            }
            match self.tick().await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::info!("Market data exhausted");
                    break Ok(());
                }
                Err(OrchestratorError::MarketDataError(e)) => {
                    tracing::error!("Market data failed: {}", e);
                    break Err(OrchestratorError::MarketDataError(e));
                }
                Err(e) => {
                    // Continue running despite errors
                    tracing::error!("Tick error: {}", e);
                }
            }
            if !self.poll_interval.is_zero() {
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        if let Some(diagnostics) = &self.diagnostics {
            if let Err(e) = diagnostics.lock().await.flush() {
                tracing::warn!("Failed to flush diagnostics: {}", e);
            }
        }

        *self.is_running.write().await = false;
        tracing::info!("Signal orchestrator stopped");
        result
    }

    /// Execute one cycle. Returns None once the feed is exhausted.
    ///
    /// Every allocation of the cycle is attempted; the first execution
    /// failure is returned after the rest have been dispatched.
    pub async fn tick(&self) -> Result<Option<CycleReport>, OrchestratorError> {
        // 1. Next slice
        let slice = match self.feed.lock().await.next_slice().await? {
            Some(slice) => slice,
            None => return Ok(None),
        };

        // 2. Marks for execution. The engine still sees the slice if this fails.
        let mut first_failure = None;
        let mut failures = 0;
        let mut execution = self.execution.lock().await;
        if let Err(e) = execution.on_market(&slice).await {
            tracing::warn!("Execution rejected marks at {}: {}", slice.timestamp, e);
            failures += 1;
            first_failure = Some(e);
        }

        // 3. Engine cycle
        let (report, weight) = {
            let mut engine = self.engine.write().await;
            let report = engine.on_slice(&slice);
            (report, engine.config().entry_weight_per_leg)
        };

        // 4. Diagnostics and execution
        for pair_decision in &report.decisions {
            if let Some(diagnostics) = &self.diagnostics {
                let observation = ZScoreObservation::new(report.timestamp, pair_decision);
                if let Err(e) = diagnostics.lock().await.record(&observation) {
                    tracing::warn!("Diagnostics dropped for {}: {}", pair_decision.pair, e);
                }
            }

            let allocation = TargetAllocation::from_decision(report.timestamp, pair_decision, weight);
            if let Err(e) = execution.apply(&allocation).await {
                tracing::warn!("Execution failed for {}: {}", allocation.pair, e);
                failures += 1;
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
        drop(execution);

        {
            let mut counters = self.counters.write().await;
            counters.cycles += 1;
            counters.decisions += report.decisions.len() as u64;
            counters.flats += report.decisions.iter().filter(|d| d.decision.is_flat()).count() as u64;
            counters.entries += report.decisions.iter().filter(|d| !d.decision.is_flat()).count() as u64;
            counters.skipped += report.skipped.len() as u64;
            counters.execution_failures += failures;
        }

        match first_failure {
            Some(e) => Err(e.into()),
            None => Ok(Some(report)),
        }
    }

    /// Stop the loop after the current cycle
    pub async fn stop(&self) {
        *self.stop_requested.write().await = true;
        *self.is_running.write().await = false;
        tracing::info!("Stop signal sent to orchestrator");
    }

    /// Get current status snapshot
    pub async fn status(&self) -> OrchestratorStatus {
        let engine = self.engine.read().await;
        let pair_states = engine
            .pairs()
            .iter()
            .map(|pair| (pair.to_string(), engine.state(pair).unwrap_or_default()))
            .collect();

        OrchestratorStatus {
            is_running: *self.is_running.read().await,
            is_ready: engine.is_ready(),
            counters: self.counters.read().await.clone(),
            pair_states,
        }
    }

    /// Shared handle to the execution adapter
    pub fn execution(&self) -> Arc<Mutex<E>> {
        Arc::clone(&self.execution)
    }

    /// Shared handle to the engine
    pub fn engine(&self) -> Arc<RwLock<SignalEngine>> {
        Arc::clone(&self.engine)
    }
}

// Implement Clone for SignalOrchestrator (needed for sharing across tasks)
impl<F: MarketDataPort, E: ExecutionPort> Clone for SignalOrchestrator<F, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            feed: Arc::clone(&self.feed),
            execution: Arc::clone(&self.execution),
            diagnostics: self.diagnostics.clone(),
            is_running: Arc::clone(&self.is_running),
            stop_requested: Arc::clone(&self.stop_requested),
            counters: Arc::clone(&self.counters),
            poll_interval: self.poll_interval,
        }
    }
}
