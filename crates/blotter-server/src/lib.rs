//! # Blotter Server
//!
//! REST and WebSocket server for the Blotter trade blotter.
//!
//! ## Features
//!
//! - REST API for the live curve, positions, P&L and reset
//! - WebSocket streaming of every published snapshot
//! - Health endpoint reporting scheduler state and tick health
//! - Configuration via TOML file
//!
//! ## Usage
//!
//! ```ignore
//! use blotter_server::Server;
//!
//! let server = Server::new(config, engine, scheduler);
//! server.start(shutdown_signal()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod websocket;

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use blotter_engine::{MarketEngine, UpdateScheduler};

pub use config::ServerConfig;
pub use error::ServerError;

/// The Blotter server.
pub struct Server {
    config: ServerConfig,
    engine: Arc<MarketEngine>,
    scheduler: Arc<UpdateScheduler>,
}

impl Server {
    /// Create a new server.
    pub fn new(
        config: ServerConfig,
        engine: Arc<MarketEngine>,
        scheduler: Arc<UpdateScheduler>,
    ) -> Self {
        Self {
            config,
            engine,
            scheduler,
        }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        routes::create_router_with_send_timeout(
            self.engine.clone(),
            self.scheduler.clone(),
            self.config.ws_send_timeout(),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&self.config.cors_origins))
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = bind_addr(&self.config.host, self.config.port);

        info!("Starting Blotter server on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Listen address for `host`, falling back to all interfaces when `host`
/// is not an IP address.
fn bind_addr(host: &str, port: u16) -> SocketAddr {
    let ip = host.parse::<IpAddr>().unwrap_or_else(|_| {
        warn!("Invalid host '{}', binding to 0.0.0.0", host);
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    });
    SocketAddr::new(ip, port)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        assert_eq!(
            bind_addr("127.0.0.1", 8000),
            "127.0.0.1:8000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(bind_addr("::1", 8000).to_string(), "[::1]:8000");
    }

    #[test]
    fn test_bind_addr_invalid_host_falls_back() {
        assert_eq!(
            bind_addr("not a host", 9000),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
    }
}
