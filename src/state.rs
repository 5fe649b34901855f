//! Process-wide gateway state.
//!
//! One [`GatewayState`] is created per bootstrap and shared by `Arc` with the
//! connection handlers. Published ports are write-once: the bootstrap fills
//! them in as listeners come up, everything else only reads them.

use std::sync::OnceLock;

use crate::session::SessionRegistry;

/// Ports advertised to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedPorts {
    /// Port of the `ws://` listener.
    pub plain: u16,
    /// Port of the `wss://` listener, `None` when no certificate is installed.
    pub secured: Option<u16>,
}

/// Shared state with process lifetime.
#[derive(Debug, Default)]
pub struct GatewayState {
    sessions: SessionRegistry,
    plain_port: OnceLock<u16>,
    secured_port: OnceLock<Option<u16>>,
}

impl GatewayState {
    /// Create state with an empty session registry and nothing published.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub(crate) fn publish_plain_port(&self, port: u16) {
        if self.plain_port.set(port).is_err() {
            tracing::warn!(port, "Plain port already published, ignoring");
        }
    }

    pub(crate) fn publish_secured_port(&self, port: Option<u16>) {
        if self.secured_port.set(port).is_err() {
            tracing::warn!(port = ?port, "Secured port already published, ignoring");
        }
    }

    /// Port of the plain listener, once it is bound.
    pub fn plain_port(&self) -> Option<u16> {
        self.plain_port.get().copied()
    }

    /// Port of the secured listener. `None` both before startup finishes and
    /// when TLS is disabled; use [`GatewayState::published_ports`] to tell
    /// the two apart.
    pub fn secured_port(&self) -> Option<u16> {
        self.secured_port.get().copied().flatten()
    }

    /// Both ports, available once startup has completed.
    pub fn published_ports(&self) -> Option<PublishedPorts> {
        Some(PublishedPorts {
            plain: *self.plain_port.get()?,
            secured: *self.secured_port.get()?,
        })
    }
}
