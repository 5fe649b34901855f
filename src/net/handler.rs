//! Boundary between the listeners and the per-session protocol handler.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::ws::WebSocket;
use futures_util::future::BoxFuture;

use crate::net::connection::ConnectionId;
use crate::net::listener::Scheme;

/// Facts about an accepted connection, passed to the handler with the socket.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_id: ConnectionId,
    pub scheme: Scheme,
    pub peer_addr: SocketAddr,
    /// Request path of the upgrade request.
    pub path: String,
}

/// Receives every upgraded WebSocket from a listener.
///
/// The returned future runs on its own task for the life of the connection.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, socket: WebSocket, context: ConnectionContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut> ConnectionHandler for F
where
    F: Fn(WebSocket, ConnectionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, socket: WebSocket, context: ConnectionContext) -> BoxFuture<'static, ()> {
        Box::pin(self(socket, context))
    }
}
