//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (ws:// via axum, or wss:// via axum-server + rustls)
//!     → tls.rs (identity loaded from ssl/PKCS12Cert.pfx, secured only)
//!     → WebSocket upgrade, connection.rs (limits, lifecycle tracking)
//!     → handler.rs (hand off to the injected session handler)
//! ```
//!
//! # Design Decisions
//! - Sockets are bound before the factory returns, so bind errors are
//!   reported to the bootstrap instead of a background task
//! - TLS is optional: the presence of the certificate file switches it on
//! - The protocol handler is injected; this layer only provides transport

pub mod connection;
pub mod handler;
pub mod listener;
pub mod tls;

pub use handler::{ConnectionContext, ConnectionHandler};
pub use listener::{start_listener, ListenerConfig, ListenerError, RunningListener, Scheme, Transport};
pub use tls::{TlsError, TlsIdentity};
