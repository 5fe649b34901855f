//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Session registry → Plain listener → Publish port
//!         → Certificate probe → [Secured listener → Publish port]
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Listeners stop accepting → Ports released
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, there is no partial startup
//! - A listener bound before a later failure is stopped again
//! - Listeners run for the process lifetime once startup succeeds

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{bootstrap, Gateway, StartupError};
