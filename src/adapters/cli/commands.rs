//! CLI Command Handlers
//!
//! Implementation of the backtest and validate commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::adapters::diagnostics::JsonlDiagnostics;
use crate::adapters::execution::PaperExecution;
use crate::adapters::market_data::CsvReplayFeed;
use crate::application::SignalOrchestrator;
use crate::config::{load_config, Config, DiagnosticsSection};
use crate::strategy::{EngineConfig, ThresholdPolicy};

/// Pairs Engine - Statistical Arbitrage Signal Engine
#[derive(Parser, Debug)]
#[command(
    name = "pairs-engine",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Statistical arbitrage signal engine for cointegrated equity pairs",
    long_about = "Pairs Engine tracks the log-price spread of configured instrument pairs, \
                  z-scores it over a rolling window and emits long/short/flat decisions \
                  that are replayed against a paper account."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay historical closes through the engine and a paper account
    Backtest(BacktestCmd),

    /// Check a configuration file without running anything
    Validate(ValidateCmd),
}

/// Run backtesting
#[derive(Parser, Debug)]
pub struct BacktestCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/pairs.toml")]
    pub config: PathBuf,

    /// Override lookback period
    #[arg(long, value_name = "PERIODS")]
    pub lookback: Option<usize>,

    /// Use the adaptive threshold policy
    #[arg(long)]
    pub adaptive: bool,

    /// Override target weight per leg
    #[arg(long, value_name = "WEIGHT")]
    pub weight: Option<f64>,

    /// Write z-score diagnostics as JSON lines
    #[arg(long, value_name = "FILE")]
    pub diagnostics: Option<PathBuf>,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct ValidateCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/pairs.toml")]
    pub config: PathBuf,
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Backtest(cmd) => &cmd.config,
            Command::Validate(cmd) => &cmd.config,
        }
    }
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    // Config level is only a fallback; a broken file is reported by the command itself
    let config_level = load_config(app.command.config_path())
        .map(|c| c.logging.level)
        .ok();
    init_logging(app.verbose, app.debug, config_level.as_deref())?;

    match app.command {
        Command::Backtest(cmd) => backtest_command(cmd).await,
        Command::Validate(cmd) => validate_command(cmd).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, config_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level.unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

/// Apply command-line overrides on top of the file and re-validate
fn apply_overrides(mut config: Config, cmd: &BacktestCmd) -> Result<Config> {
    if let Some(lookback) = cmd.lookback {
        config.engine.lookback = lookback;
    }
    if cmd.adaptive {
        config.engine.threshold_policy = ThresholdPolicy::Adaptive;
    }
    if let Some(weight) = cmd.weight {
        config.engine.entry_weight_per_leg = weight;
    }
    if let Some(path) = &cmd.diagnostics {
        config.diagnostics = Some(DiagnosticsSection {
            path: path.display().to_string(),
        });
    }
    config.validate().context("Invalid overrides")?;
    Ok(config)
}

/// Handle backtest command
async fn backtest_command(cmd: BacktestCmd) -> Result<()> {
    tracing::info!("Config: {}", cmd.config.display());

    let config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load config from {}", cmd.config.display()))?;
    let config = apply_overrides(config, &cmd)?;
    let engine_config = EngineConfig::from(&config);

    let feed_path = config.feed.get_path();
    let feed = CsvReplayFeed::from_path(&feed_path, config.feed.replay_window())
        .with_context(|| format!("Failed to open price feed {}", feed_path))?;
    let slices = feed.total();

    let execution = PaperExecution::new(config.paper.initial_cash);
    let mut orchestrator = SignalOrchestrator::new(engine_config.clone(), feed, execution)
        .context("Engine refused to start")?;

    if let Some(diagnostics) = &config.diagnostics {
        let path = diagnostics.get_path();
        let sink = JsonlDiagnostics::create(&path)
            .with_context(|| format!("Failed to create diagnostics file {}", path))?;
        orchestrator = orchestrator.with_diagnostics(sink);
    }

    // Setup Ctrl+C handler
    let orch = orchestrator.clone();
    let shutdown = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            orch.stop().await;
        }
    });

    let outcome = orchestrator.run().await;
    shutdown.abort();
    outcome.context("Backtest aborted")?;

    let status = orchestrator.status().await;
    let summary = orchestrator.execution().lock().await.summary();

    println!("Backtest Configuration:");
    println!("  Pairs: {}", engine_config.pairs.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", "));
    println!("  Lookback: {} periods", engine_config.lookback);
    println!("  Threshold Policy: {:?}", engine_config.threshold_policy);
    println!("  Weight per Leg: {}", engine_config.entry_weight_per_leg);
    println!("  Slices: {}", slices);
    if let Some(diagnostics) = &config.diagnostics {
        println!("  Diagnostics: {}", diagnostics.get_path());
    }

    println!();
    println!("Signals:");
    println!("  Cycles:             {}", status.counters.cycles);
    println!("  Decisions:          {}", status.counters.decisions);
    println!("  Entries:            {}", status.counters.entries);
    println!("  Liquidations:       {}", status.counters.flats);
    println!("  Skipped:            {}", status.counters.skipped);
    println!("  Execution Failures: {}", status.counters.execution_failures);
    for (pair, state) in &status.pair_states {
        println!("  {:<18}  {}", pair, state);
    }

    println!();
    println!("Paper Account:");
    println!("  Starting Capital: ${:.2}", summary.initial_cash);
    println!("  Final Equity:     ${:.2}", summary.final_equity);
    println!("  Return:           {:+.2}%", summary.return_pct);
    println!("  Max Drawdown:     {:.2}%", summary.max_drawdown_pct);
    println!("  Fills:            {}", summary.fills);
    println!("  Open Positions:   {}", summary.open_positions);

    Ok(())
}

/// Handle validate command
async fn validate_command(cmd: ValidateCmd) -> Result<()> {
    let config = load_config(&cmd.config)
        .with_context(|| format!("Invalid config {}", cmd.config.display()))?;

    println!("✓ {} is valid", cmd.config.display());
    println!("  Pairs: {}", config.pairs.len());
    println!("  Lookback: {}", config.engine.lookback);
    println!("  Feed: {}", config.feed.get_path());

    Ok(())
}
