//! Blotter server entry point.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blotter_engine::{MarketEngineBuilder, UpdateScheduler};
use blotter_ext_file::{load_curve, load_positions, sod_parameters, validate_positions};
use blotter_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,blotter=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Blotter Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/blotter.toml".to_string());

    let server_config = if std::path::Path::new(&config_path).exists() {
        info!("Loading configuration from {}", config_path);
        ServerConfig::from_file(&config_path)
            .with_context(|| format!("reading configuration from {}", config_path))?
    } else {
        info!("Using default configuration");
        ServerConfig::default()
    };

    // Reference data
    let positions = load_positions(&server_config.positions_file);
    validate_positions(&positions);
    let curve = load_curve(&server_config.curve_file);
    let sod = sod_parameters(&curve, server_config.engine.sod);

    // Build engine
    let engine = MarketEngineBuilder::new()
        .with_config(server_config.engine.clone())
        .with_sod_parameters(sod)
        .with_positions(positions)
        .build()
        .context("building market engine")?;
    let engine = Arc::new(engine);

    // Start periodic updates
    let scheduler = Arc::new(UpdateScheduler::new(engine.clone()));
    scheduler.start();

    // Serve until ctrl-c
    let server = Server::new(server_config, engine, scheduler.clone());
    let served = server.start(shutdown_signal()).await;

    scheduler.stop().await;
    served.context("serving HTTP")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
