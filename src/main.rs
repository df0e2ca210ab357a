//! walletwatch - single-address wallet health dashboard
//!
//! Watches one wallet on Base: node health with failover, balance, ETH price,
//! trend and risk score, persisted to SQLite and served over HTTP.

mod analysis;
mod cache;
mod config;
mod db;
mod fallback;
mod node;
mod price;
mod report;
mod wallet;
mod web;

use config::ServerConfig;
use db::Store;
use node::HealthMonitor;
use price::PriceFeed;
use report::{PipelineSettings, ReportPipeline};
use wallet::{AddressResolver, FixedAddress, KeyWalletResolver};
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("walletwatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting walletwatch on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);
    tracing::debug!("Configuration: {:?}", cfg);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized with {} stored reports", store.count_reports()?);

    let wallet: Arc<dyn AddressResolver> = match &cfg.watch_address {
        Some(address) => Arc::new(FixedAddress(address.clone())),
        None => Arc::new(KeyWalletResolver::new(cfg.private_key.clone())),
    };
    tracing::info!("Watching {}", wallet.resolve_address());

    let monitor = HealthMonitor::from_config(&cfg)?;
    if !monitor.has_secondary() {
        tracing::info!("No secondary RPC configured; failover disabled");
    }
    let price = PriceFeed::from_config(&cfg)?;

    let pipeline = Arc::new(ReportPipeline::new(
        PipelineSettings::from(&cfg),
        wallet,
        monitor,
        price,
        store.clone(),
    ));

    // Start web server
    let server = Server::new(cfg, store, pipeline);
    server.start().await?;

    Ok(())
}
