//! Remote-desktop WebSocket gateway bootstrap.
//!
//! Brings up the process-wide session registry and one or two WebSocket
//! listeners: `ws://` always, `wss://` when `ssl/PKCS12Cert.pfx` exists
//! under the application root.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod state;

pub use config::GatewayConfig;
pub use lifecycle::{bootstrap, Gateway, StartupError};
pub use net::{ConnectionContext, ConnectionHandler};
pub use state::{GatewayState, PublishedPorts};
