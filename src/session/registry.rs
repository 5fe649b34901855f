//! Process-wide session registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::metrics;
use crate::session::SessionError;

/// A live remote session as seen by the registry.
///
/// Implemented by whatever subsystem drives the remote-desktop protocol.
pub trait SessionManager: Send + Sync + 'static {
    /// Identifier minted by [`SessionRegistry::next_session_id`].
    fn session_id(&self) -> &str;
}

/// Shared handle stored in the registry.
pub type SessionHandle = Arc<dyn SessionManager>;

/// Mapping of session id to session manager, plus the id counter.
///
/// Created empty with the counter at zero when the gateway starts.
#[derive(Default)]
pub struct SessionRegistry {
    counter: AtomicU64,
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter and return the new value as a session id.
    pub fn next_session_id(&self) -> String {
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        id.to_string()
    }

    /// Number of ids minted so far.
    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Register a session under its own id.
    pub fn insert(&self, handle: SessionHandle) -> Result<(), SessionError> {
        let id = handle.session_id().to_string();
        match self.sessions.entry(id) {
            Entry::Occupied(entry) => Err(SessionError::Duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!(session_id = %entry.key(), "Session registered");
                entry.insert(handle);
                metrics::record_session_count(self.sessions.len());
                Ok(())
            }
        }
    }

    /// Unregister a session, returning its handle if it was present.
    pub fn remove(&self, id: &str) -> Option<SessionHandle> {
        let removed = self.sessions.remove(id).map(|(_, handle)| handle);
        if removed.is_some() {
            tracing::debug!(session_id = %id, "Session unregistered");
            metrics::record_session_count(self.sessions.len());
        }
        removed
    }

    /// Look up a session.
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of the registered ids, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("counter", &self.counter())
            .field("sessions", &self.len())
            .finish()
    }
}
