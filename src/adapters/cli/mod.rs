//! CLI Adapter
//!
//! `pairs-engine backtest` replays a price file through the engine and a
//! paper account; `pairs-engine validate` checks a config file.

mod commands;

pub use commands::{BacktestCmd, CliApp, Command, ValidateCmd};

/// Parse process arguments
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> anyhow::Result<()> {
    commands::execute(app).await
}
