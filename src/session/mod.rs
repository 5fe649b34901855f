//! Remote session bookkeeping.
//!
//! # Data Flow
//! ```text
//! WebSocket upgraded (net::listener)
//!     → ConnectionHandler (socket.rs, or a protocol engine)
//!     → registry.rs: next_session_id() + insert(handle)
//!     → ... session runs ...
//!     → registry.rs: remove(id)
//! ```
//!
//! # Design Decisions
//! - The registry owns only the container; sessions are created elsewhere
//! - Concurrent map so request handlers never contend on a single lock
//! - The id counter only grows; ids are never reused within a process

pub mod registry;
pub mod socket;

use thiserror::Error;

pub use registry::{SessionHandle, SessionManager, SessionRegistry};
pub use socket::SessionSocketHandler;

/// Errors raised by registry mutations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session with the same id is already registered.
    #[error("session {0} is already registered")]
    Duplicate(String),
}
