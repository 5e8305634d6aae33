//! Pairs Engine - Statistical Arbitrage Signal Engine
//!
//! Replays historical closes through the pairs engine and a paper account.

use anyhow::Result;
use pairs_engine::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (PAIRS_FEED_PATH, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
