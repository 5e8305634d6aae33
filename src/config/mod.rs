//! Configuration Module
//!
//! TOML engine, feed, paper-account and diagnostics settings, validated
//! before the engine is built.

pub mod loader;

pub use loader::{load_config, parse_config, Config, ConfigError, DiagnosticsSection, FeedSection};
