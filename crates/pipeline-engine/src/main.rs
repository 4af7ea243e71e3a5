//! pipeline-engine: screen the registry for strict quarterly revenue growth and
//! label the watchlist BUY / HOLD / SELL.
//!
//! Usage:
//!   cargo run -p pipeline-engine
//!   cargo run -p pipeline-engine -- --max-tickers 500 --output run1
//!   cargo run -p pipeline-engine -- --watchlist NVDA,AMD,GE --watchlist-only

use market_data_client::MarketDataClient;
use output_store::OutputStore;
use pipeline_engine::{EngineConfig, Pipeline};
use sec_client::SecClient;
use std::sync::Arc;

const USAGE: &str = "\
Usage: pipeline-engine [--output DIR] [--watchlist A,B,C] [--max-tickers N] [--watchlist-only]

Environment:
  SEC_USER_AGENT           required for full runs, e.g. \"Jane Doe jane@example.com\"
  OUTPUT_DIR               default: output
  WATCHLIST                comma separated tickers
  MAX_TICKERS              limit the screened universe
  SEC_REQUEST_DELAY_MS     default: 200
  MARKET_REQUEST_DELAY_MS  default: 100
  REQUEST_TIMEOUT_SECS     default: 20";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pipeline_engine=info,revenue_screener=info,signal_classifier=info,output_store=info,sec_client=warn,market_data_client=warn".into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    let config = match EngineConfig::from_env(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    tracing::info!(
        "Output: {} | watchlist: {} tickers | mode: {:?}",
        config.output_dir.display(),
        config.watchlist.len(),
        config.mode
    );

    let filings = match config.sec_user_agent.as_deref() {
        Some(agent) => Some(Arc::new(SecClient::new(agent, config.request_timeout)?)),
        None => None,
    };
    let market = Arc::new(MarketDataClient::new(config.request_timeout)?);
    let store = OutputStore::open(&config.output_dir)?;

    let summary = Pipeline::new(filings, market, store, config).run().await?;

    tracing::info!(
        "Screened {} tickers: {} passed | watchlist {}: {} BUY, {} HOLD, {} SELL",
        summary.tickers,
        summary.screen.passed,
        summary.watchlist,
        summary.buy,
        summary.hold,
        summary.sell
    );
    Ok(())
}
