//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides applied by main.rs
//!     → validation.rs (port overrides resolved against defaults)
//!     → GatewayConfig + ResolvedPorts handed to the bootstrap
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; running without a config file is normal
//! - Port overrides stay raw strings until validation so typos are fatal
//! - Validation runs before any socket is bound

pub mod loader;
pub mod schema;
pub mod validation;

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

pub use schema::{GatewayConfig, LogFormat, LoggingConfig, WebSocketConfig};
pub use validation::{ResolvedPorts, DEFAULT_PORT, DEFAULT_PORT_SECURED};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A port override is present but is not a valid port number.
    #[error("{setting} override {value:?} is not a valid port: {source}")]
    InvalidPort {
        setting: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// A value is outside its permitted range.
    #[error("{setting}: {reason}")]
    OutOfRange {
        setting: &'static str,
        reason: String,
    },
}
