//! End-to-end tests: a real server on a loopback port, real WebSocket
//! clients, and assertions against the hub's observable counters.

use futures_util::{SinkExt, StreamExt};
use hearth_auth::TokenStore;
use hearth_node::api::{create_router, AppState};
use hearth_node::config::WsConfig;
use hearth_realtime::{Event, Hub, RoomName};
use hearth_types::{HouseholdId, Identity};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    hub: Hub,
    tokens: Arc<TokenStore>,
}

impl TestServer {
    async fn start(ws: WsConfig) -> Self {
        let hub = Hub::spawn();
        let tokens = Arc::new(TokenStore::new());
        let state = AppState {
            hub: hub.clone(),
            verifier: tokens.clone(),
            ws: Arc::new(ws),
        };
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, hub, tokens }
    }

    fn token_for(&self, user_id: &str, household_id: &str) -> String {
        self.tokens
            .issue(Identity::new(user_id, household_id), None)
            .unwrap()
    }

    async fn connect(&self, query: &str) -> WsClient {
        let url = format!("ws://{}/ws{}", self.addr, query);
        let (ws, _) = connect_async(url).await.unwrap();
        ws
    }

    /// Poll until the household room reaches the expected size.
    async fn wait_room_size(&self, household_id: &str, expected: Option<usize>) {
        let room = RoomName::household(&HouseholdId::new(household_id));
        for _ in 0..300 {
            if self.hub.room_size(&room).await == expected {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "room {room} never reached size {expected:?}, last seen {:?}",
            self.hub.room_size(&room).await
        );
    }

    /// Poll until the hub reports the expected number of live connections.
    async fn wait_connections(&self, expected: usize) {
        for _ in 0..600 {
            if self.hub.stats().await.current_connections == expected {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "connection count never reached {expected}, last seen {}",
            self.hub.stats().await.current_connections
        );
    }
}

/// Read frames until a text message arrives, skipping keepalive traffic.
async fn next_text(ws: &mut WsClient) -> Option<String> {
    let deadline = Duration::from_secs(2);
    loop {
        let msg = timeout(deadline, ws.next()).await.ok()??;
        match msg.unwrap() {
            Message::Text(text) => return Some(text.as_str().to_string()),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Assert that no text message arrives within a short window.
async fn assert_silent(ws: &mut WsClient) {
    let result = timeout(Duration::from_millis(300), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.as_str().to_string()),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    })
    .await;
    assert!(
        matches!(result, Err(_) | Ok(None)),
        "expected no message, got {result:?}"
    );
}

#[tokio::test]
async fn test_token_in_query_receives_household_events() {
    let server = TestServer::start(WsConfig::default()).await;
    let token = server.token_for("user-1", "house-1");

    let mut ws = server.connect(&format!("?token={token}")).await;
    server.wait_room_size("house-1", Some(1)).await;

    server
        .hub
        .broadcast_to_household(
            &HouseholdId::new("house-1"),
            "task:completed",
            json!({"taskId": "t-42", "by": "user-2"}),
        )
        .await;

    let received = next_text(&mut ws).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&received).unwrap();
    assert_eq!(parsed["type"], "task:completed");
    assert_eq!(parsed["data"]["taskId"], "t-42");
}

#[tokio::test]
async fn test_bearer_header_authenticates() {
    let server = TestServer::start(WsConfig::default()).await;
    let token = server.token_for("user-1", "house-1");

    let mut request = format!("ws://{}/ws", server.addr)
        .into_client_request()
        .unwrap();
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {token}").parse().unwrap(),
    );
    let (_ws, _) = connect_async(request).await.unwrap();

    server.wait_room_size("house-1", Some(1)).await;
}

#[tokio::test]
async fn test_in_band_auth_frame() {
    let server = TestServer::start(WsConfig::default()).await;
    let token = server.token_for("user-1", "house-1");

    let mut ws = server.connect("").await;
    ws.send(Message::text(
        json!({"type": "auth", "token": token}).to_string(),
    ))
    .await
    .unwrap();
    server.wait_room_size("house-1", Some(1)).await;

    server
        .hub
        .broadcast_to_household(&HouseholdId::new("house-1"), "task:created", json!({}))
        .await;
    assert!(next_text(&mut ws).await.is_some());
}

#[tokio::test]
async fn test_unauthenticated_client_receives_nothing() {
    let server = TestServer::start(WsConfig::default()).await;

    let mut ws = server.connect("").await;
    server.wait_connections(1).await;

    // Join attempt without credentials is dropped without a reply.
    ws.send(Message::text(
        json!({"type": "join:household", "householdId": "house-1"}).to_string(),
    ))
    .await
    .unwrap();

    // Give the reader time to process (and drop) the frame.
    sleep(Duration::from_millis(100)).await;
    let room = RoomName::household(&HouseholdId::new("house-1"));
    assert_eq!(server.hub.room_size(&room).await, None);

    server
        .hub
        .broadcast_to_household(&HouseholdId::new("house-1"), "task:created", json!({}))
        .await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_invalid_token_never_joins() {
    let server = TestServer::start(WsConfig::default()).await;

    let mut ws = server
        .connect("?token=hearth_deadbeef_0000000000000000000000000000000a")
        .await;
    server.wait_connections(1).await;

    let room = RoomName::household(&HouseholdId::new("house-1"));
    assert_eq!(server.hub.room_size(&room).await, None);
    server
        .hub
        .broadcast_to_household(&HouseholdId::new("house-1"), "task:created", json!({}))
        .await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_disconnect_leaves_room_and_others_keep_receiving() {
    let server = TestServer::start(WsConfig::default()).await;
    let token_a = server.token_for("user-a", "house-1");
    let token_b = server.token_for("user-b", "house-1");

    let ws_a = server.connect(&format!("?token={token_a}")).await;
    let mut ws_b = server.connect(&format!("?token={token_b}")).await;
    server.wait_room_size("house-1", Some(2)).await;

    // Abrupt disconnect: drop the stream without a close handshake.
    drop(ws_a);
    server.wait_room_size("house-1", Some(1)).await;

    server
        .hub
        .broadcast_to_household(&HouseholdId::new("house-1"), "task:updated", json!({}))
        .await;
    assert!(next_text(&mut ws_b).await.is_some());

    drop(ws_b);
    server.wait_room_size("house-1", None).await;
    server.wait_connections(0).await;
}

#[tokio::test]
async fn test_leave_frame_stops_delivery() {
    let server = TestServer::start(WsConfig::default()).await;
    let token = server.token_for("user-1", "house-1");

    let mut ws = server.connect(&format!("?token={token}")).await;
    server.wait_room_size("house-1", Some(1)).await;

    ws.send(Message::text(
        json!({"type": "leave:household", "householdId": "house-1"}).to_string(),
    ))
    .await
    .unwrap();
    server.wait_room_size("house-1", None).await;

    server
        .hub
        .broadcast_to_household(&HouseholdId::new("house-1"), "task:created", json!({}))
        .await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_events_only_reach_their_household() {
    let server = TestServer::start(WsConfig::default()).await;
    let token_a = server.token_for("user-a", "house-1");
    let token_b = server.token_for("user-b", "house-2");

    let mut ws_a = server.connect(&format!("?token={token_a}")).await;
    let mut ws_b = server.connect(&format!("?token={token_b}")).await;
    server.wait_room_size("house-1", Some(1)).await;
    server.wait_room_size("house-2", Some(1)).await;

    server
        .hub
        .broadcast_to_household(
            &HouseholdId::new("house-1"),
            "task:created",
            json!({"taskId": "t-1"}),
        )
        .await;

    let received = next_text(&mut ws_a).await.unwrap();
    assert!(received.contains("t-1"));
    assert_silent(&mut ws_b).await;
}

#[tokio::test]
async fn test_idle_client_is_torn_down() {
    let server = TestServer::start(WsConfig {
        keepalive_interval_secs: 1,
        idle_read_timeout_secs: 2,
        write_timeout_secs: 2,
        ..WsConfig::default()
    })
    .await;
    let token = server.token_for("user-1", "house-1");

    // Never poll the socket, so the client answers no pings and sends
    // no frames of its own.
    let ws = server.connect(&format!("?token={token}")).await;
    server.wait_room_size("house-1", Some(1)).await;

    server.wait_connections(0).await;
    server.wait_room_size("house-1", None).await;
    drop(ws);
}

#[tokio::test]
async fn test_stalled_writer_deregisters_client() {
    let server = TestServer::start(WsConfig {
        write_timeout_secs: 1,
        ..WsConfig::default()
    })
    .await;
    let token = server.token_for("user-1", "house-1");

    // A peer that completes the handshake but never reads. Its socket
    // buffers fill, a write times out, and the writer's exit must tear
    // the whole connection down even though the read side stays open.
    let ws = server.connect(&format!("?token={token}")).await;
    server.wait_room_size("house-1", Some(1)).await;

    let blob = "x".repeat(64 * 1024);
    for _ in 0..256 {
        server
            .hub
            .broadcast_to_household(
                &HouseholdId::new("house-1"),
                "task:updated",
                json!({"blob": &blob}),
            )
            .await;
    }

    server.wait_connections(0).await;
    server.wait_room_size("house-1", None).await;
    drop(ws);
}

#[tokio::test]
async fn test_broadcast_order_preserved_per_room() {
    let server = TestServer::start(WsConfig::default()).await;
    let token = server.token_for("user-1", "house-1");

    let mut ws = server.connect(&format!("?token={token}")).await;
    server.wait_room_size("house-1", Some(1)).await;

    for seq in 0..10 {
        server
            .hub
            .broadcast(
                RoomName::household(&HouseholdId::new("house-1")),
                &Event::new("task:created", json!({"seq": seq})),
            )
            .await;
    }

    for seq in 0..10 {
        let received = next_text(&mut ws).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&received).unwrap();
        assert_eq!(parsed["data"]["seq"], seq, "events arrived out of order");
    }
}
