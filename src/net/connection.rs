//! WebSocket connection tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count open sessions per listener and enforce `max_connections`
//! - Release the slot when the session task ends, even on panic

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::net::listener::Scheme;
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough, only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks open connections on one listener.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    scheme: Scheme,
    active: Arc<AtomicUsize>,
    max_connections: usize,
}

impl ConnectionTracker {
    pub fn new(scheme: Scheme, max_connections: usize) -> Self {
        Self {
            scheme,
            active: Arc::new(AtomicUsize::new(0)),
            max_connections,
        }
    }

    /// Claim a slot for a new connection.
    ///
    /// Returns `None` when the listener is already at `max_connections`.
    pub fn try_track(&self) -> Option<ConnectionGuard> {
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |active| {
                (active < self.max_connections).then_some(active + 1)
            })
            .ok()?;

        metrics::record_connection_opened(self.scheme);
        Some(ConnectionGuard {
            scheme: self.scheme,
            active: Arc::clone(&self.active),
            id: ConnectionId::new(),
        })
    }

    /// Current open connection count.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// Holds a connection slot; releases it when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    scheme: Scheme,
    active: Arc<AtomicUsize>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        metrics::record_connection_closed(self.scheme);
        tracing::trace!(connection_id = %self.id, scheme = %self.scheme, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn tracker_counts_guards() {
        let tracker = ConnectionTracker::new(Scheme::Plain, 10);
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.try_track().unwrap();
        let guard2 = tracker.try_track().unwrap();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);
        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn tracker_refuses_past_limit() {
        let tracker = ConnectionTracker::new(Scheme::Secured, 1);
        let guard = tracker.try_track().unwrap();
        assert!(tracker.try_track().is_none());
        assert_eq!(tracker.active_count(), 1);

        drop(guard);
        assert!(tracker.try_track().is_some());
    }
}
