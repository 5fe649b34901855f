//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the gateway's TOML
//! file. Every section is optional.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Application root; the TLS certificate is looked up under `ssl/`.
    pub application_root: PathBuf,

    /// WebSocket listener settings.
    pub websocket: WebSocketConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            application_root: PathBuf::from("."),
            websocket: WebSocketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Address both listeners bind to.
    pub bind_address: IpAddr,

    /// Plain (`ws://`) port override. Kept as text until validation.
    pub port: Option<String>,

    /// Secured (`wss://`) port override. Kept as text until validation.
    pub port_secured: Option<String>,

    /// Maximum concurrent WebSocket sessions per listener.
    pub max_connections: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: None,
            port_secured: None,
            max_connections: 10_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub filter: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "remote_gateway=info,tower_http=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}
