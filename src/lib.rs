//! Pairs Engine - Statistical Arbitrage Signal Library
//!
//! Tracks the log-price spread of instrument pairs and emits mean reversion
//! decisions when the spread z-score crosses an entry threshold.
//!
//! # Modules
//!
//! - `domain`: Core value types (Instrument, Pair, PriceSlice, Decision)
//! - `ports`: Trait abstractions (MarketDataPort, ExecutionPort, DiagnosticsPort)
//! - `strategy`: Signal generation (PriceWindow, SpreadStatistics, ThresholdPolicy, SignalEngine)
//! - `adapters`: External implementations (CSV replay, paper execution, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Orchestrator driving the engine cycle by cycle

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
