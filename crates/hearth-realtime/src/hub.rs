//! The hub: a single control-loop task owning the room registry.
//!
//! All registry mutation is serialized through one task. Other tasks
//! hold a [`Hub`] handle and communicate intent over bounded channels;
//! none of them ever touch the registries directly. This single-writer
//! design needs no locks on the shared maps and makes hub behavior a
//! deterministic function of request arrival order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use hearth_types::HouseholdId;

use crate::client::{Client, ClientId};
use crate::event::Event;
use crate::room::RoomName;

/// Capacity of the control request channel.
const CONTROL_CAPACITY: usize = 64;

/// Capacity of the broadcast request channel. Producers of events
/// block beyond this, which is the intended backpressure on them;
/// delivery to individual clients never blocks.
const BROADCAST_CAPACITY: usize = 256;

/// Registry-mutating requests handled by the control loop.
enum Control {
    Register(Arc<Client>),
    Unregister(ClientId),
    Join(Arc<Client>, RoomName),
    Leave(Arc<Client>, RoomName),
    Stats(oneshot::Sender<HubStats>),
    RoomSize(RoomName, oneshot::Sender<Option<usize>>),
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Control::Register(c) => write!(f, "Register({})", c.id),
            Control::Unregister(id) => write!(f, "Unregister({})", id),
            Control::Join(c, room) => write!(f, "Join({}, {})", c.id, room),
            Control::Leave(c, room) => write!(f, "Leave({}, {})", c.id, room),
            Control::Stats(_) => write!(f, "Stats"),
            Control::RoomSize(room, _) => write!(f, "RoomSize({})", room),
        }
    }
}

/// A pre-serialized event addressed to one room.
struct RoomMessage {
    room: RoomName,
    payload: String,
}

/// Handle to the hub control loop.
///
/// Cheap to clone; constructed once at process start and passed into
/// every component that registers connections or broadcasts events.
#[derive(Debug, Clone)]
pub struct Hub {
    control_tx: mpsc::Sender<Control>,
    broadcast_tx: mpsc::Sender<RoomMessage>,
}

impl Hub {
    /// Spawns the control loop and returns a handle to it.
    ///
    /// The loop runs for the life of the process; it terminates only
    /// when every handle has been dropped.
    pub fn spawn() -> Self {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_CAPACITY);

        tokio::spawn(run(control_rx, broadcast_rx));

        Self {
            control_tx,
            broadcast_tx,
        }
    }

    /// Admit a newly connected client into the master set.
    ///
    /// Grants no room membership.
    pub async fn register(&self, client: Arc<Client>) {
        self.send_control(Control::Register(client)).await;
    }

    /// Remove a client from the master set and from every room it
    /// belongs to, closing its outbound queue. Idempotent; unknown
    /// clients are a no-op.
    pub async fn unregister(&self, client_id: ClientId) {
        self.send_control(Control::Unregister(client_id)).await;
    }

    /// Add a client to a room, creating the room if absent. Idempotent.
    pub async fn join(&self, client: Arc<Client>, room: RoomName) {
        self.send_control(Control::Join(client, room)).await;
    }

    /// Remove a client from a room, deleting the room if it becomes
    /// empty. Idempotent.
    pub async fn leave(&self, client: Arc<Client>, room: RoomName) {
        self.send_control(Control::Leave(client, room)).await;
    }

    /// Broadcast an event to every current member of a room.
    ///
    /// The event is serialized exactly once. Delivery to each member is
    /// a non-blocking enqueue: a full queue drops the message for that
    /// member only. An unknown room is a silent no-op. Fire-and-forget:
    /// callers get no delivery feedback and must not assume synchronous
    /// delivery.
    pub async fn broadcast(&self, room: RoomName, event: &Event) {
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(room = %room, error = %e, "Dropping unserializable event");
                return;
            }
        };

        if self
            .broadcast_tx
            .send(RoomMessage { room, payload })
            .await
            .is_err()
        {
            warn!("Hub control loop is gone; broadcast dropped");
        }
    }

    /// Broadcast a business event to a household's room.
    ///
    /// This is the collaborator contract for business-logic operations:
    /// call it after committing a state change, as a best-effort side
    /// effect that never influences the primary operation's outcome.
    pub async fn broadcast_to_household(
        &self,
        household_id: &HouseholdId,
        event_type: &str,
        payload: serde_json::Value,
    ) {
        self.broadcast(
            RoomName::household(household_id),
            &Event::new(event_type, payload),
        )
        .await;
    }

    /// Current hub statistics.
    pub async fn stats(&self) -> HubStats {
        let (tx, rx) = oneshot::channel();
        self.send_control(Control::Stats(tx)).await;
        rx.await.unwrap_or_default()
    }

    /// Membership count of a room, or `None` if the room does not
    /// exist. Rooms cease to exist the moment their last member leaves.
    pub async fn room_size(&self, room: &RoomName) -> Option<usize> {
        let (tx, rx) = oneshot::channel();
        self.send_control(Control::RoomSize(room.clone(), tx)).await;
        rx.await.unwrap_or(None)
    }

    async fn send_control(&self, request: Control) {
        if let Err(e) = self.control_tx.send(request).await {
            warn!(request = ?e.0, "Hub control loop is gone; request dropped");
        }
    }
}

/// Registries owned exclusively by the control loop.
#[derive(Default)]
struct HubState {
    /// Master set of connected clients.
    clients: HashMap<ClientId, Arc<Client>>,
    /// Room registry; entries are always non-empty.
    rooms: HashMap<RoomName, HashSet<ClientId>>,
    stats: HubStats,
}

/// The control loop. Drains both input channels one request at a time;
/// no fairness guarantee between them beyond eventual service.
async fn run(mut control_rx: mpsc::Receiver<Control>, mut broadcast_rx: mpsc::Receiver<RoomMessage>) {
    let mut state = HubState::default();

    loop {
        tokio::select! {
            Some(request) = control_rx.recv() => state.handle_control(request),
            Some(message) = broadcast_rx.recv() => state.handle_broadcast(message),
            else => break,
        }
    }

    debug!("Hub control loop stopped");
}

impl HubState {
    fn handle_control(&mut self, request: Control) {
        match request {
            Control::Register(client) => {
                info!(client_id = %client.id, "Client registered");
                self.clients.insert(client.id.clone(), client);
                self.stats.total_connections += 1;
            }
            Control::Unregister(client_id) => {
                let Some(client) = self.clients.remove(&client_id) else {
                    return; // unknown or already removed
                };

                for room in client.rooms() {
                    self.remove_member(&room, &client_id);
                }
                client.cache_clear();
                client.close_queue();
                info!(client_id = %client_id, "Client unregistered");
            }
            Control::Join(client, room) => {
                if !self.clients.contains_key(&client.id) {
                    debug!(client_id = %client.id, room = %room, "Join for unregistered client ignored");
                    return;
                }

                let members = self.rooms.entry(room.clone()).or_default();
                if members.insert(client.id.clone()) {
                    client.cache_join(room.clone());
                    self.stats.total_joins += 1;
                    debug!(client_id = %client.id, room = %room, "Client joined room");
                }
            }
            Control::Leave(client, room) => {
                self.remove_member(&room, &client.id);
                client.cache_leave(&room);
            }
            Control::Stats(reply) => {
                let mut stats = self.stats.clone();
                stats.current_connections = self.clients.len();
                let _ = reply.send(stats);
            }
            Control::RoomSize(room, reply) => {
                let _ = reply.send(self.rooms.get(&room).map(HashSet::len));
            }
        }
    }

    fn handle_broadcast(&mut self, message: RoomMessage) {
        self.stats.total_events += 1;

        let Some(members) = self.rooms.get(&message.room) else {
            trace!(room = %message.room, "Broadcast to absent room ignored");
            return;
        };

        let mut recipients = 0;
        let mut dropped = 0;
        for client_id in members {
            let Some(client) = self.clients.get(client_id) else {
                continue;
            };
            match client.try_send(message.payload.clone()) {
                Ok(()) => recipients += 1,
                Err(_) => dropped += 1,
            }
        }
        self.stats.dropped_messages += dropped;

        debug!(
            room = %message.room,
            recipients,
            dropped,
            "Event broadcast"
        );
    }

    /// Removes a member from a room, deleting the room entry the
    /// instant it becomes empty.
    fn remove_member(&mut self, room: &RoomName, client_id: &ClientId) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(client_id);
            if members.is_empty() {
                self.rooms.remove(room);
                debug!(room = %room, "Room removed");
            }
        }
    }
}

/// Hub statistics.
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Current number of connections.
    pub current_connections: usize,
    /// Total connections since start.
    pub total_connections: u64,
    /// Total room joins since start.
    pub total_joins: u64,
    /// Total events broadcast since start.
    pub total_events: u64,
    /// Messages dropped due to full or closed client queues.
    pub dropped_messages: u64,
}
