//! Default connection handler: session bookkeeping around a WebSocket.
//!
//! Each upgraded socket gets a fresh session id and a registry entry that
//! lives exactly as long as the socket. Frame processing belongs to the
//! remote-desktop protocol engine; this handler only reads until the client
//! goes away.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use futures_util::future::BoxFuture;

use crate::net::{ConnectionContext, ConnectionHandler, Scheme};
use crate::session::SessionManager;
use crate::state::GatewayState;

/// A session bound to one WebSocket connection.
#[derive(Debug)]
pub struct SocketSession {
    id: String,
    scheme: Scheme,
    peer_addr: SocketAddr,
    opened_at: Instant,
    frames_received: AtomicU64,
}

impl SocketSession {
    fn new(id: String, context: &ConnectionContext) -> Self {
        Self {
            id,
            scheme: context.scheme,
            peer_addr: context.peer_addr,
            opened_at: Instant::now(),
            frames_received: AtomicU64::new(0),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }
}

impl SessionManager for SocketSession {
    fn session_id(&self) -> &str {
        &self.id
    }
}

/// Registers a [`SocketSession`] for every accepted connection.
#[derive(Debug, Clone)]
pub struct SessionSocketHandler {
    state: Arc<GatewayState>,
}

impl SessionSocketHandler {
    pub fn new(state: Arc<GatewayState>) -> Self {
        Self { state }
    }
}

impl ConnectionHandler for SessionSocketHandler {
    fn handle(&self, socket: WebSocket, context: ConnectionContext) -> BoxFuture<'static, ()> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let sessions = state.sessions();
            let session = Arc::new(SocketSession::new(sessions.next_session_id(), &context));
            if let Err(e) = sessions.insert(session.clone()) {
                tracing::error!(connection_id = %context.connection_id, error = %e, "Session not registered");
                return;
            }

            tracing::info!(
                session_id = %session.id,
                connection_id = %context.connection_id,
                scheme = %session.scheme(),
                peer_addr = %session.peer_addr(),
                "Remote session opened"
            );

            read_until_closed(socket, &session).await;

            sessions.remove(&session.id);
            tracing::info!(
                session_id = %session.id,
                frames = session.frames_received(),
                duration_ms = session.opened_at.elapsed().as_millis() as u64,
                "Remote session closed"
            );
        })
    }
}

async fn read_until_closed(mut socket: WebSocket, session: &SocketSession) {
    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                session.frames_received.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::debug!(session_id = %session.id, error = %e, "WebSocket read failed");
                break;
            }
        }
    }
}
