//! The `/ws` endpoint: connection upgrade, credential checks, and the
//! per-connection reader/writer tasks.
//!
//! Each accepted socket gets a [`Client`] registered with the hub, a
//! reader that applies inbound control frames, and a writer that drains
//! the client's outbound queue. The writer never blocks the hub: the
//! hub drops messages for a full queue, and the writer bounds every
//! socket write with a timeout. When either side stops (close frame,
//! read error, idle timeout, failed write) the connection is torn down
//! and the client is unregistered from every room.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use hearth_realtime::{create_client, Client, ClientReceiver, ControlFrame, RoomName};
use hearth_types::HouseholdId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, timeout, Instant};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::config::WsConfig;

/// Routes served by this module.
pub(crate) fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Bearer header wins; the query parameter exists for browser
    // clients that cannot set headers on a WebSocket upgrade.
    let token = bearer_token(&headers).or_else(|| params.get("token").cloned());

    ws.max_message_size(state.ws.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, token))
}

/// Extract a token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Own one connection from upgrade to teardown.
async fn handle_socket(socket: WebSocket, state: AppState, token: Option<String>) {
    let (client, outbound) = create_client();
    let client_id = client.id.clone();

    state.hub.register(client.clone()).await;
    info!(client_id = %client_id, "WebSocket client connected");

    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_pump(ws_tx, outbound, state.ws.clone()));

    if let Some(token) = token {
        try_authenticate(&state, &client, &token).await;
    }

    // A finished writer means a failed or timed-out write: the
    // connection is unusable even if the peer keeps sending frames, so
    // it is torn down without waiting on the reader. When the reader
    // finishes first, unregistering closes the outbound queue and the
    // writer drains what is buffered, sends a close frame, and exits.
    tokio::select! {
        _ = read_pump(ws_rx, &state, &client) => {
            state.hub.unregister(client_id.clone()).await;
            let _ = writer.await;
        }
        _ = &mut writer => {
            state.hub.unregister(client_id.clone()).await;
        }
    }

    info!(client_id = %client_id, "WebSocket client disconnected");
}

/// Verify a credential and, on success, bind the identity to the client
/// and join it to its household room. Rejections are logged but never
/// reported to the client.
async fn try_authenticate(state: &AppState, client: &Arc<Client>, token: &str) {
    let identity = match state.verifier.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            debug!(client_id = %client.id, error = %e, "Credential rejected");
            return;
        }
    };

    let household_id = identity.household_id.clone();
    if !client.authenticate(identity) {
        debug!(client_id = %client.id, "Client already authenticated");
        return;
    }
    info!(
        client_id = %client.id,
        household_id = %household_id,
        "Client authenticated"
    );

    state
        .hub
        .join(client.clone(), RoomName::household(&household_id))
        .await;
}

/// Read frames until the connection ends.
///
/// Every inbound frame refreshes the idle timer, including the pong
/// replies elicited by keepalive pings, so a healthy but quiet client
/// is never disconnected.
async fn read_pump(mut ws_rx: SplitStream<WebSocket>, state: &AppState, client: &Arc<Client>) {
    let idle = state.ws.idle_read_timeout();

    loop {
        let next = match timeout(idle, ws_rx.next()).await {
            Ok(next) => next,
            Err(_) => {
                info!(client_id = %client.id, "Idle timeout, closing connection");
                break;
            }
        };

        match next {
            Some(Ok(Message::Text(text))) => match ControlFrame::parse(text.as_str()) {
                Some(frame) => apply_frame(state, client, frame).await,
                None => debug!(client_id = %client.id, "Ignoring unrecognized frame"),
            },
            Some(Ok(Message::Close(_))) | None => break,
            // Pings, pongs, and binary frames only refresh the idle timer.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!(client_id = %client.id, error = %e, "WebSocket read error");
                break;
            }
        }
    }
}

/// Apply one parsed control frame.
///
/// Frames that the client is not entitled to send (joins before
/// authentication, rooms outside its household) are dropped without a
/// reply, matching the treatment of malformed input.
async fn apply_frame(state: &AppState, client: &Arc<Client>, frame: ControlFrame) {
    match frame {
        ControlFrame::Auth { token } => {
            if client.is_authenticated() {
                debug!(client_id = %client.id, "Ignoring repeated auth frame");
                return;
            }
            try_authenticate(state, client, &token).await;
        }
        ControlFrame::JoinHousehold { household_id } => {
            if !scope_allows(client, &household_id) {
                debug!(
                    client_id = %client.id,
                    household_id = %household_id,
                    "Join refused: not authenticated for this household"
                );
                return;
            }
            state
                .hub
                .join(client.clone(), RoomName::household(&household_id))
                .await;
        }
        ControlFrame::LeaveHousehold { household_id } => {
            if !scope_allows(client, &household_id) {
                debug!(
                    client_id = %client.id,
                    household_id = %household_id,
                    "Leave refused: not authenticated for this household"
                );
                return;
            }
            state
                .hub
                .leave(client.clone(), RoomName::household(&household_id))
                .await;
        }
    }
}

/// A client may only address the household its identity belongs to.
fn scope_allows(client: &Client, household_id: &HouseholdId) -> bool {
    client.household_id().is_some_and(|own| own == household_id)
}

/// Drain the outbound queue onto the socket.
///
/// Sends a keepalive ping after each idle interval; delivering a data
/// message resets the timer. A `None` from the queue means the hub has
/// unregistered the client, so the writer says goodbye and exits. Any
/// failed or timed-out write also ends the task; the connection handler
/// treats that as fatal and deregisters the client.
async fn write_pump(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: ClientReceiver,
    config: Arc<WsConfig>,
) {
    let mut keepalive = interval_at(
        Instant::now() + config.keepalive_interval(),
        config.keepalive_interval(),
    );

    loop {
        tokio::select! {
            maybe = outbound.recv() => match maybe {
                Some(payload) => {
                    if timed_send(&mut ws_tx, Message::Text(payload.into()), config.write_timeout())
                        .await
                        .is_err()
                    {
                        break;
                    }
                    keepalive.reset();
                }
                None => {
                    let _ = timed_send(&mut ws_tx, Message::Close(None), config.write_timeout()).await;
                    break;
                }
            },
            _ = keepalive.tick() => {
                if timed_send(&mut ws_tx, Message::Ping(Bytes::new()), config.write_timeout())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}

async fn timed_send(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    message: Message,
    limit: Duration,
) -> Result<(), ()> {
    match timeout(limit, ws_tx.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            debug!(error = %e, "WebSocket write failed");
            Err(())
        }
        Err(_) => {
            warn!("WebSocket write timed out");
            Err(())
        }
    }
}
