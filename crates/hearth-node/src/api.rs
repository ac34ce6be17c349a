//! HTTP API for the node: health, hub statistics, and the WebSocket
//! endpoint (mounted by [`crate::ws_api`] when enabled).

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use hearth_auth::CredentialVerifier;
use hearth_realtime::Hub;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::WsConfig;
use crate::ws_api::ws_routes;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The realtime hub.
    pub hub: Hub,
    /// Verifier for client-supplied credentials.
    pub verifier: Arc<dyn CredentialVerifier>,
    /// WebSocket endpoint settings.
    pub ws: Arc<WsConfig>,
}

/// Build the node's router.
///
/// The `/ws` route is mounted only when WebSockets are enabled in the
/// configuration; the rest of the API is always available.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/realtime/stats", get(get_stats));

    if state.ws.enabled {
        router = router.merge(ws_routes());
    } else {
        tracing::info!("WebSocket endpoint disabled by configuration");
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Hub counters as exposed over HTTP.
#[derive(Debug, Serialize)]
struct StatsResponse {
    current_connections: usize,
    total_connections: u64,
    total_joins: u64,
    total_events: u64,
    dropped_messages: u64,
}

async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.hub.stats().await;
    Json(StatsResponse {
        current_connections: stats.current_connections,
        total_connections: stats.total_connections,
        total_joins: stats.total_joins,
        total_events: stats.total_events,
        dropped_messages: stats.dropped_messages,
    })
}
