//! Hearth node entry point.

use anyhow::Context;
use clap::Parser;
use hearth_auth::{CredentialVerifier, TokenStore};
use hearth_node::api::{create_router, AppState};
use hearth_node::config::{Config, WsConfig};
use hearth_node::observability::init_logging;
use hearth_realtime::Hub;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "hearth-node", about = "Hearth realtime notification node", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen_addr: SocketAddr,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Serve the HTTP API without the WebSocket endpoint.
    #[arg(long)]
    no_websocket: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    let config = Config {
        listen_addr: args.listen_addr,
        log_level: args.log_level,
        log_json: args.log_json,
        websocket: WsConfig {
            enabled: !args.no_websocket,
            ..WsConfig::default()
        },
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        websocket = config.websocket.enabled,
        "Starting Hearth node"
    );

    let hub = Hub::spawn();
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(TokenStore::new());
    let state = AppState {
        hub,
        verifier,
        ws: Arc::new(config.websocket.clone()),
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "Listening");

    axum::serve(listener, create_router(state))
        .await
        .context("server error")?;

    Ok(())
}
