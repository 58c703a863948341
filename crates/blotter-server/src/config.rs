//! Server configuration.

use std::time::Duration;

use blotter_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Positions CSV
    #[serde(default = "default_positions_file")]
    pub positions_file: String,

    /// Start-of-day curve CSV
    #[serde(default = "default_curve_file")]
    pub curve_file: String,

    /// Allowed CORS origins; any origin when empty
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Upper bound on a single WebSocket send, in milliseconds
    #[serde(default = "default_ws_send_timeout_ms")]
    pub ws_send_timeout_ms: u64,

    /// Market engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_positions_file() -> String {
    "data/positions.csv".to_string()
}

fn default_curve_file() -> String {
    "data/sod_curve.csv".to_string()
}

fn default_ws_send_timeout_ms() -> u64 {
    1_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            positions_file: default_positions_file(),
            curve_file: default_curve_file(),
            cors_origins: Vec::new(),
            ws_send_timeout_ms: default_ws_send_timeout_ms(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, std::io::Error> {
        toml::from_str(content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// WebSocket send timeout.
    pub fn ws_send_timeout(&self) -> Duration {
        Duration::from_millis(self.ws_send_timeout_ms)
    }
}
