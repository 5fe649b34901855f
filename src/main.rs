//! Remote-desktop WebSocket gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                 REMOTE GATEWAY                 │
//!                    │                                                │
//!  ws://  :8181 ─────┼─▶ plain listener ──┐                           │
//!                    │                    ├─▶ connection handler ──┐  │
//!  wss:// :8431 ─────┼─▶ secured listener ┘   (per session)        │  │
//!                    │        ▲                                    ▼  │
//!                    │        │ ssl/PKCS12Cert.pfx        session registry
//!                    │                                                │
//!                    │  config · logging · metrics · lifecycle        │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use remote_gateway::config::loader::load_config;
use remote_gateway::config::LoggingConfig;
use remote_gateway::lifecycle::signals::wait_for_termination;
use remote_gateway::observability::logging::init_logging;
use remote_gateway::session::SessionSocketHandler;
use remote_gateway::{bootstrap, GatewayConfig};

#[derive(Parser)]
#[command(name = "remote-gateway", version)]
#[command(about = "WebSocket gateway for remote-desktop sessions", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application root containing `ssl/PKCS12Cert.pfx`.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Plain WebSocket port (default 8181).
    #[arg(long)]
    port: Option<String>,

    /// Secured WebSocket port (default 8431).
    #[arg(long)]
    port_secured: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(root) = self.root {
            config.application_root = root;
        }
        if let Some(port) = self.port {
            config.websocket.port = Some(port);
        }
        if let Some(port) = self.port_secured {
            config.websocket.port_secured = Some(port);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref().map(load_config).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            // No configured subscriber yet; report through the default one.
            let _ = init_logging(&LoggingConfig::default());
            tracing::error!(config = ?cli.config, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    cli.apply(&mut config);

    init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        application_root = ?config.application_root,
        "remote-gateway starting"
    );

    let gateway = bootstrap(&config, SessionSocketHandler::new).await?;
    for listener in gateway.listeners() {
        match listener.url() {
            Ok(url) => tracing::info!(url = %url, "Accepting WebSocket sessions"),
            Err(e) => tracing::warn!(error = %e, "Listener address is not a valid URL"),
        }
    }

    wait_for_termination().await?;
    gateway.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
