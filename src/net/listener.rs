//! WebSocket listener factory.
//!
//! # Responsibilities
//! - Bind the configured address synchronously so failures surface at startup
//! - Serve `ws://` with axum or `wss://` with axum-server + rustls
//! - Upgrade every request to a WebSocket and dispatch it to the handler
//! - Enforce `max_connections` per listener
//! - Stop accepting on shutdown and release the port

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::lifecycle::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::net::handler::{ConnectionContext, ConnectionHandler};
use crate::net::tls::TlsIdentity;
use crate::observability::metrics;

/// How long `shutdown` waits for the accept loop before aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Listener transport scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Unencrypted `ws://`.
    Plain,
    /// TLS-terminated `wss://`.
    Secured,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Plain => "ws",
            Scheme::Secured => "wss",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport of a listener. Only a secured transport carries an identity.
#[derive(Debug, Clone)]
pub enum Transport {
    Plain,
    Secured(TlsIdentity),
}

/// Everything needed to start one listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub transport: Transport,
    pub max_connections: usize,
}

impl ListenerConfig {
    pub fn plain(bind_address: IpAddr, port: u16) -> Self {
        Self {
            bind_address,
            port,
            transport: Transport::Plain,
            max_connections: 10_000,
        }
    }

    pub fn secured(bind_address: IpAddr, port: u16, identity: TlsIdentity) -> Self {
        Self {
            bind_address,
            port,
            transport: Transport::Secured(identity),
            max_connections: 10_000,
        }
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn scheme(&self) -> Scheme {
        match self.transport {
            Transport::Plain => Scheme::Plain,
            Transport::Secured(_) => Scheme::Secured,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {scheme}://{addr}: {source}")]
    Bind {
        scheme: Scheme,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The bound socket could not be prepared for the async runtime.
    #[error("failed to configure {scheme}://{addr}: {source}")]
    Configure {
        scheme: Scheme,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// A bound listener whose accept loop runs on a background task.
pub struct RunningListener {
    scheme: Scheme,
    local_addr: SocketAddr,
    tracker: ConnectionTracker,
    shutdown: Shutdown,
    task: JoinHandle<io::Result<()>>,
}

impl RunningListener {
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Port actually bound, which differs from the configured one for port 0.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Client-facing URL, e.g. `wss://0.0.0.0:8431/`.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}://{}/", self.scheme, self.local_addr))
    }

    /// Number of WebSocket sessions currently open on this listener.
    pub fn active_connections(&self) -> usize {
        self.tracker.active_count()
    }

    /// Stop accepting connections and release the port.
    ///
    /// Sessions already handed to the handler keep running.
    pub async fn shutdown(self) {
        self.shutdown.trigger();

        let mut task = self.task;
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                tracing::warn!(scheme = %self.scheme, error = %e, "Listener exited with error");
            }
            Ok(Err(e)) => {
                tracing::warn!(scheme = %self.scheme, error = %e, "Listener task failed");
            }
            Err(_) => {
                tracing::warn!(scheme = %self.scheme, "Listener did not stop in time, aborting");
                task.abort();
                let _ = task.await;
            }
        }
        tracing::info!(scheme = %self.scheme, address = %self.local_addr, "Listener stopped");
    }
}

impl std::fmt::Debug for RunningListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningListener")
            .field("scheme", &self.scheme)
            .field("local_addr", &self.local_addr)
            .field("active_connections", &self.active_connections())
            .finish()
    }
}

/// State shared by the upgrade handler of one listener.
#[derive(Clone)]
struct ListenerState {
    scheme: Scheme,
    tracker: ConnectionTracker,
    handler: Arc<dyn ConnectionHandler>,
}

/// Bind a listener and start accepting WebSocket connections.
///
/// Returns once the socket is bound; accepting continues on a spawned task
/// until [`RunningListener::shutdown`] is called.
pub async fn start_listener(
    config: ListenerConfig,
    handler: Arc<dyn ConnectionHandler>,
) -> Result<RunningListener, ListenerError> {
    let scheme = config.scheme();
    let addr = config.socket_addr();

    let std_listener = StdTcpListener::bind(addr).map_err(|source| {
        tracing::error!(scheme = %scheme, address = %addr, error = %source, "Failed to bind listener");
        ListenerError::Bind { scheme, addr, source }
    })?;
    let configure_error = |source| ListenerError::Configure { scheme, addr, source };
    std_listener.set_nonblocking(true).map_err(configure_error)?;
    let local_addr = std_listener.local_addr().map_err(configure_error)?;

    let tracker = ConnectionTracker::new(scheme, config.max_connections);
    let app = Router::new()
        .route("/", get(upgrade_handler))
        .route("/{*path}", get(upgrade_handler))
        .with_state(ListenerState {
            scheme,
            tracker: tracker.clone(),
            handler,
        })
        .layer(TraceLayer::new_for_http())
        .into_make_service_with_connect_info::<SocketAddr>();

    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();

    let task = match config.transport {
        Transport::Plain => {
            let listener = tokio::net::TcpListener::from_std(std_listener).map_err(configure_error)?;
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move { stop.wait().await })
                    .await
            })
        }
        Transport::Secured(identity) => {
            let handle = axum_server::Handle::new();
            let stop_handle = handle.clone();
            tokio::spawn(async move {
                stop.wait().await;
                stop_handle.shutdown();
            });
            let server = axum_server::tls_rustls::from_tcp_rustls(std_listener, identity.rustls_config())
                .handle(handle);
            tokio::spawn(async move { server.serve(app).await })
        }
    };

    metrics::record_listener_started(scheme);
    tracing::info!(
        scheme = %scheme,
        address = %local_addr,
        max_connections = config.max_connections,
        "Listener accepting connections"
    );

    Ok(RunningListener {
        scheme,
        local_addr,
        tracker,
        shutdown,
        task,
    })
}

async fn upgrade_handler(
    State(state): State<ListenerState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    uri: Uri,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(guard) = state.tracker.try_track() else {
        tracing::warn!(
            scheme = %state.scheme,
            peer_addr = %peer_addr,
            max_connections = state.tracker.max_connections(),
            "Connection limit reached, refusing upgrade"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    let context = ConnectionContext {
        connection_id: guard.id(),
        scheme: state.scheme,
        peer_addr,
        path: uri.path().to_string(),
    };
    tracing::debug!(
        connection_id = %context.connection_id,
        scheme = %context.scheme,
        peer_addr = %peer_addr,
        path = %context.path,
        "WebSocket upgrade accepted"
    );

    let handler = Arc::clone(&state.handler);
    ws.on_upgrade(move |socket| async move {
        let _guard = guard;
        handler.handle(socket, context).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::WebSocket;
    use std::net::Ipv4Addr;

    #[test]
    fn scheme_names() {
        assert_eq!(Scheme::Plain.to_string(), "ws");
        assert_eq!(Scheme::Secured.to_string(), "wss");
    }

    #[test]
    fn plain_config_has_no_identity() {
        let config = ListenerConfig::plain(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8181);
        assert_eq!(config.scheme(), Scheme::Plain);
        assert!(matches!(config.transport, Transport::Plain));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8181");
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let handler: Arc<dyn ConnectionHandler> =
            Arc::new(|_socket: WebSocket, _context: ConnectionContext| async {});

        let err = start_listener(
            ListenerConfig::plain(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
            handler,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ListenerError::Bind { scheme: Scheme::Plain, .. }));
    }

    #[tokio::test]
    async fn shutdown_releases_the_port() {
        let handler: Arc<dyn ConnectionHandler> =
            Arc::new(|_socket: WebSocket, _context: ConnectionContext| async {});
        let listener = start_listener(
            ListenerConfig::plain(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            handler,
        )
        .await
        .unwrap();

        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);
        assert_eq!(listener.url().unwrap().scheme(), "ws");

        listener.shutdown().await;
        StdTcpListener::bind(addr).unwrap();
    }
}
