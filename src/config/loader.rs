//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/pairs.toml.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::adapters::execution::DEFAULT_INITIAL_CASH;
use crate::adapters::market_data::ReplayWindow;
use crate::domain::Pair;
use crate::strategy::params::{
    EngineConfig, HistoryScope, DEFAULT_ENTRY_WEIGHT_PER_LEG, DEFAULT_LOOKBACK,
};
use crate::strategy::threshold::ThresholdPolicy;

/// Main configuration structure matching config/pairs.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
    pub pairs: Vec<PairSection>,
    pub feed: FeedSection,
    #[serde(default)]
    pub paper: PaperSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub diagnostics: Option<DiagnosticsSection>,
}

/// Engine configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Samples per price window
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// "static" or "adaptive"
    #[serde(default)]
    pub threshold_policy: ThresholdPolicy,
    /// "shared" or "per_pair"
    #[serde(default)]
    pub history_scope: HistoryScope,
    /// Cap on retained z-scores per history (unbounded when absent)
    #[serde(default)]
    pub history_cap: Option<usize>,
    /// Target weight per leg on entry (1.5 multi-pair, 0.5 single pair)
    #[serde(default = "default_entry_weight")]
    pub entry_weight_per_leg: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            threshold_policy: ThresholdPolicy::default(),
            history_scope: HistoryScope::default(),
            history_cap: None,
            entry_weight_per_leg: default_entry_weight(),
        }
    }
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_entry_weight() -> f64 {
    DEFAULT_ENTRY_WEIGHT_PER_LEG
}

/// One `[[pairs]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct PairSection {
    pub leg_a: String,
    pub leg_b: String,
}

/// Market data feed section
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    /// CSV file of `timestamp,symbol,close` rows
    pub path: String,
    /// First date replayed (inclusive)
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last date replayed (inclusive)
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl FeedSection {
    /// Feed path with environment override and `~` expansion.
    /// Checks PAIRS_FEED_PATH env var first, falls back to config value
    pub fn get_path(&self) -> String {
        let raw = std::env::var("PAIRS_FEED_PATH").unwrap_or_else(|_| self.path.clone());
        shellexpand::tilde(&raw).to_string()
    }

    pub fn replay_window(&self) -> ReplayWindow {
        ReplayWindow::new(self.start, self.end)
    }
}

/// Paper account section
#[derive(Debug, Clone, Deserialize)]
pub struct PaperSection {
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
}

impl Default for PaperSection {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
        }
    }
}

fn default_initial_cash() -> f64 {
    DEFAULT_INITIAL_CASH
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Diagnostics sink section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsSection {
    /// JSON-lines output path
    pub path: String,
}

impl DiagnosticsSection {
    pub fn get_path(&self) -> String {
        shellexpand::tilde(&self.path).to_string()
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        EngineConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.feed.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "feed path cannot be empty".to_string(),
            ));
        }

        if let (Some(start), Some(end)) = (self.feed.start, self.feed.end) {
            if start > end {
                return Err(ConfigError::ValidationError(format!(
                    "feed start {} is after end {}",
                    start, end
                )));
            }
        }

        if !self.paper.initial_cash.is_finite() || self.paper.initial_cash <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "initial_cash must be > 0, got {}",
                self.paper.initial_cash
            )));
        }

        if let Some(diagnostics) = &self.diagnostics {
            if diagnostics.path.is_empty() {
                return Err(ConfigError::ValidationError(
                    "diagnostics path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

// Conversion from Config to EngineConfig
impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        EngineConfig {
            lookback: config.engine.lookback,
            threshold_policy: config.engine.threshold_policy,
            history_scope: config.engine.history_scope,
            history_cap: config.engine.history_cap,
            pairs: config
                .pairs
                .iter()
                .map(|p| Pair::new(p.leg_a.as_str(), p.leg_b.as_str()))
                .collect(),
            entry_weight_per_leg: config.engine.entry_weight_per_leg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[engine]
lookback = 20
threshold_policy = "adaptive"
history_scope = "per_pair"
history_cap = 500
entry_weight_per_leg = 1.5

[[pairs]]
leg_a = "KO"
leg_b = "PEP"

[[pairs]]
leg_a = "AAPL"
leg_b = "MSFT"

[[pairs]]
leg_a = "BAC"
leg_b = "JPM"

[feed]
path = "data/prices.csv"
start = "2022-01-01"
end = "2024-01-01"

[paper]
initial_cash = 100000.0

[logging]
level = "info"

[diagnostics]
path = "out/zscores.jsonl"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.engine.lookback, 20);
        assert_eq!(config.engine.threshold_policy, ThresholdPolicy::Adaptive);
        assert_eq!(config.engine.history_scope, HistoryScope::PerPair);
        assert_eq!(config.engine.history_cap, Some(500));
        assert_eq!(config.pairs.len(), 3);
        assert_eq!(config.feed.start, NaiveDate::from_ymd_opt(2022, 1, 1));
        assert_eq!(config.paper.initial_cash, 100_000.0);
        assert_eq!(config.diagnostics.unwrap().path, "out/zscores.jsonl");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/pairs.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let minimal = r#"
[[pairs]]
leg_a = "AAPL"
leg_b = "MSFT"

[feed]
path = "prices.csv"
"#;
        let config = parse_config(minimal).unwrap();
        assert_eq!(config.engine.lookback, 20);
        assert_eq!(config.engine.threshold_policy, ThresholdPolicy::Static);
        assert_eq!(config.engine.history_scope, HistoryScope::Shared);
        assert_eq!(config.engine.entry_weight_per_leg, 1.5);
        assert_eq!(config.paper.initial_cash, 100_000.0);
        assert_eq!(config.logging.level, "info");
        assert!(config.diagnostics.is_none());
        assert_eq!(config.feed.replay_window(), ReplayWindow::default());
    }

    #[test]
    fn test_invalid_lookback() {
        let invalid = create_valid_config().replace("lookback = 20", "lookback = 0");
        let result = parse_config(&invalid);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_pairs_rejected() {
        let invalid = r#"
pairs = []

[feed]
path = "prices.csv"
"#;
        let result = parse_config(invalid);
        assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("No pairs")));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let invalid = create_valid_config().replace("\"adaptive\"", "\"magic\"");
        assert!(matches!(parse_config(&invalid), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_inverted_date_range() {
        let invalid = create_valid_config()
            .replace("start = \"2022-01-01\"", "start = \"2025-01-01\"");
        assert!(matches!(parse_config(&invalid), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_initial_cash() {
        let invalid = create_valid_config().replace("initial_cash = 100000.0", "initial_cash = -5.0");
        assert!(matches!(parse_config(&invalid), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_to_engine_config() {
        let config = parse_config(&create_valid_config()).unwrap();
        let engine_config = EngineConfig::from(&config);

        assert_eq!(engine_config.lookback, 20);
        assert_eq!(engine_config.threshold_policy, ThresholdPolicy::Adaptive);
        assert_eq!(engine_config.history_cap, Some(500));
        assert_eq!(engine_config.pairs[0], Pair::new("KO", "PEP"));
        assert_eq!(engine_config.pairs[2], Pair::new("BAC", "JPM"));
        assert_eq!(engine_config.entry_weight_per_leg, 1.5);
    }
}
