//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration, including both port overrides
//! - Create the shared state (session registry, published ports)
//! - Start the plain listener, then the secured one if a certificate exists
//! - Publish the bound ports for client-facing components
//!
//! # Design Decisions
//! - Fail fast: every error is logged where it happens and again here, then
//!   returned; the caller must not keep serving
//! - If the secured side fails after the plain listener is up, the plain
//!   listener is stopped before the error is returned

use std::sync::Arc;

use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, GatewayConfig};
use crate::net::listener::{start_listener, ListenerConfig, ListenerError, RunningListener, Scheme};
use crate::net::tls::{self, TlsError};
use crate::net::ConnectionHandler;
use crate::state::GatewayState;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("certificate error: {0}")]
    Certificate(#[from] TlsError),

    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
}

/// A started gateway: shared state plus its running listeners.
#[derive(Debug)]
pub struct Gateway {
    state: Arc<GatewayState>,
    listeners: Vec<RunningListener>,
}

impl Gateway {
    pub fn state(&self) -> &Arc<GatewayState> {
        &self.state
    }

    pub fn listeners(&self) -> &[RunningListener] {
        &self.listeners
    }

    pub fn listener(&self, scheme: Scheme) -> Option<&RunningListener> {
        self.listeners.iter().find(|listener| listener.scheme() == scheme)
    }

    /// Stop every listener.
    pub async fn shutdown(self) {
        for listener in self.listeners {
            listener.shutdown().await;
        }
    }
}

/// Run the startup sequence.
///
/// `make_handler` receives the shared state and returns the handler every
/// accepted WebSocket is dispatched to.
pub async fn bootstrap<F, H>(config: &GatewayConfig, make_handler: F) -> Result<Gateway, StartupError>
where
    F: FnOnce(Arc<GatewayState>) -> H,
    H: ConnectionHandler,
{
    match start(config, make_handler).await {
        Ok(gateway) => Ok(gateway),
        Err(e) => {
            tracing::error!(error = %e, details = ?e, "Failed to start gateway");
            Err(e)
        }
    }
}

async fn start<F, H>(config: &GatewayConfig, make_handler: F) -> Result<Gateway, StartupError>
where
    F: FnOnce(Arc<GatewayState>) -> H,
    H: ConnectionHandler,
{
    let ports = validate_config(config)?;
    let websocket = &config.websocket;

    let state = Arc::new(GatewayState::new());
    tracing::debug!("Session registry initialized");

    let handler: Arc<dyn ConnectionHandler> = Arc::new(make_handler(Arc::clone(&state)));

    let plain = start_listener(
        ListenerConfig::plain(websocket.bind_address, ports.plain)
            .with_max_connections(websocket.max_connections),
        Arc::clone(&handler),
    )
    .await?;
    state.publish_plain_port(plain.port());

    let secured = match tls::probe(&config.application_root).await {
        Ok(None) => None,
        Ok(Some(identity)) => {
            tracing::info!(
                certificate = ?identity.path(),
                subject = identity.subject(),
                "Certificate found, enabling secured listener"
            );
            let listener_config = ListenerConfig::secured(websocket.bind_address, ports.secured, identity)
                .with_max_connections(websocket.max_connections);
            match start_listener(listener_config, handler).await {
                Ok(listener) => Some(listener),
                Err(e) => {
                    plain.shutdown().await;
                    return Err(e.into());
                }
            }
        }
        Err(e) => {
            plain.shutdown().await;
            return Err(e.into());
        }
    };
    state.publish_secured_port(secured.as_ref().map(RunningListener::port));

    tracing::info!(
        plain_port = plain.port(),
        secured_port = ?state.secured_port(),
        "Gateway started"
    );

    let mut listeners = vec![plain];
    listeners.extend(secured);
    Ok(Gateway { state, listeners })
}
