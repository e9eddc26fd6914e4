mod api;
mod config;
mod db;
mod error;
mod market;
mod scorer;
mod types;

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::ResultWriter;
use crate::error::Result;
use crate::market::MarketData;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Market data ---
    let market = MarketData::new(&cfg)?;
    match &cfg.market_data_url {
        Some(url) => info!(
            "Market trend lookups enabled via {url} (cache ttl {}s)",
            cfg.market_trend_ttl_secs
        ),
        None => warn!("MARKET_DATA_URL not set; analyses will be scored without a market trend."),
    }

    // --- HTTP API server ---
    let api_state = ApiState {
        writer: ResultWriter::new(pool.clone()),
        pool,
        market: Arc::new(market),
        health: Arc::new(HealthState::new()),
        latency: Arc::new(LatencyStats::new()),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
