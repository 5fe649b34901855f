//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → whichever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (scheme, port, peer_addr, session_id) on every event
//! - No recorder is installed here; recording is a no-op without one

pub mod logging;
pub mod metrics;
