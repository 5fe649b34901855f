//! Configuration validation.
//!
//! # Responsibilities
//! - Resolve port overrides against the built-in defaults
//! - Reject malformed overrides instead of falling back silently
//! - Check value ranges (connection limits)

use crate::config::schema::{GatewayConfig, WebSocketConfig};
use crate::config::ConfigError;

/// Default port of the plain (`ws://`) listener.
pub const DEFAULT_PORT: u16 = 8181;

/// Default port of the secured (`wss://`) listener.
pub const DEFAULT_PORT_SECURED: u16 = 8431;

/// Ports after overrides have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPorts {
    pub plain: u16,
    pub secured: u16,
}

/// Validate the configuration and resolve both listener ports.
pub fn validate_config(config: &GatewayConfig) -> Result<ResolvedPorts, ConfigError> {
    if config.websocket.max_connections == 0 {
        return Err(ConfigError::OutOfRange {
            setting: "websocket.max_connections",
            reason: "must be greater than zero".to_string(),
        });
    }
    resolve_ports(&config.websocket)
}

/// Resolve the plain and secured ports.
///
/// Both overrides are checked up front, even though the secured port is only
/// used when a certificate is installed.
pub fn resolve_ports(config: &WebSocketConfig) -> Result<ResolvedPorts, ConfigError> {
    Ok(ResolvedPorts {
        plain: resolve_port("websocket.port", config.port.as_deref(), DEFAULT_PORT)?,
        secured: resolve_port(
            "websocket.port_secured",
            config.port_secured.as_deref(),
            DEFAULT_PORT_SECURED,
        )?,
    })
}

/// Resolve a single override. Absent or blank text selects `default`.
pub fn resolve_port(
    setting: &'static str,
    raw: Option<&str>,
    default: u16,
) -> Result<u16, ConfigError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(value) => value,
    };

    value.parse::<u16>().map_err(|source| {
        tracing::error!(setting, value, error = %source, "Invalid port override");
        ConfigError::InvalidPort {
            setting,
            value: value.to_string(),
            source,
        }
    })
}
