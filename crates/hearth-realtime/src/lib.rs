//! # Hearth Real-time
//!
//! Real-time notification hub for the Hearth household task tracker.
//!
//! This crate provides the in-process publish/subscribe broker that
//! fans business events out to connected WebSocket clients, grouped
//! into per-household rooms.
//!
//! ## Features
//!
//! - **Hub**: a single control-loop task that owns the room registry
//!   and the master client set; every mutation is serialized through it
//! - **Rooms**: created on first join, removed the instant they empty
//! - **Bounded fan-out**: per-client outbound queues with a drop-on-full
//!   policy, so one slow consumer never stalls the rest
//! - **Control frames**: typed `auth` / `join:household` /
//!   `leave:household` requests decoded from inbound messages
//!
//! ## Delivery semantics
//!
//! Broadcasts to the same room are delivered to members in the order
//! the hub accepted them. There is no ordering between rooms, and a
//! join racing an in-flight broadcast to the same room may miss that
//! event; both are documented behavior, not bugs. Delivery is
//! best-effort: callers of [`Hub::broadcast`] get no per-recipient
//! feedback.
//!
//! ## Example
//!
//! ```rust
//! use hearth_realtime::{create_client, Event, Hub, RoomName};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = Hub::spawn();
//!
//! // Connect a client and join its household room
//! let (client, mut _receiver) = create_client();
//! hub.register(client.clone()).await;
//! hub.join(client, RoomName::household(&"H1".into())).await;
//!
//! // Fan an event out to the room
//! hub.broadcast_to_household(
//!     &"H1".into(),
//!     "user:updated",
//!     serde_json::json!({"name": "Alice"}),
//! )
//! .await;
//! # }
//! ```
//!
//! ## Wire protocol
//!
//! ### Client -> Server control frames
//!
//! ```json
//! {"type": "auth", "token": "<credential>"}
//! {"type": "join:household", "householdId": "<id>"}
//! {"type": "leave:household", "householdId": "<id>"}
//! ```
//!
//! ### Server -> Client event frames
//!
//! ```json
//! {"type": "<event-name>", "data": <payload>}
//! ```
//!
//! ## Architecture
//!
//! ```text
//! business logic ──broadcast──┐
//!                             ▼
//!                    ┌─────────────────┐
//!   reader tasks ──► │  control loop   │  owns: clients map,
//!  (auth/join/leave) │  (single task)  │        room registry
//!                    └────────┬────────┘
//!                             │ try_send (drop on full)
//!                             ▼
//!                  per-client bounded queues
//!                             │
//!                             ▼
//!                        writer tasks ──► WebSocket peers
//! ```

pub mod client;
pub mod error;
pub mod event;
pub mod frame;
pub mod hub;
pub mod room;

// Re-export main types
pub use client::{create_client, Client, ClientId, ClientReceiver, OUTBOUND_QUEUE_CAPACITY};
pub use error::RealtimeError;
pub use event::Event;
pub use frame::ControlFrame;
pub use hub::{Hub, HubStats};
pub use room::{RoomName, HOUSEHOLD_ROOM_PREFIX};
