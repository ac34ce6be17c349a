//! Client connection state.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use hearth_types::{HouseholdId, Identity};

use crate::error::RealtimeError;
use crate::room::RoomName;

/// Unique identifier for a connected client.
pub type ClientId = String;

/// Capacity of each client's outbound message queue.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Handle for receiving messages from the hub to write to the socket.
pub type ClientReceiver = mpsc::Receiver<String>;

/// The server-side representation of one live connection.
///
/// Shared between the hub control loop and the connection's reader and
/// writer tasks. The identity is settable exactly once; the room set is
/// an advisory cache maintained by the control loop and never treated
/// as authoritative for delivery.
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier.
    pub id: ClientId,
    /// Outbound queue; taken (closed) on deregistration.
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    /// Identity bound at authentication, immutable afterwards.
    identity: OnceCell<Identity>,
    /// Advisory snapshot of joined rooms.
    rooms: Mutex<HashSet<RoomName>>,
}

impl Client {
    fn new(id: ClientId, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            outbound: Mutex::new(Some(sender)),
            identity: OnceCell::new(),
            rooms: Mutex::new(HashSet::new()),
        }
    }

    /// Bind a verified identity to this connection.
    ///
    /// Returns false if an identity is already bound; re-authentication
    /// mid-connection is not supported.
    pub fn authenticate(&self, identity: Identity) -> bool {
        self.identity.set(identity).is_ok()
    }

    /// The bound identity, if authenticated.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Whether an identity has been bound.
    pub fn is_authenticated(&self) -> bool {
        self.identity.get().is_some()
    }

    /// The bound household, if authenticated.
    pub fn household_id(&self) -> Option<&HouseholdId> {
        self.identity.get().map(|i| &i.household_id)
    }

    /// Non-blocking enqueue of a serialized message.
    ///
    /// A full queue drops the message for this client only.
    pub fn try_send(&self, message: String) -> Result<(), RealtimeError> {
        let guard = self.outbound.lock();
        match guard.as_ref() {
            Some(sender) => sender.try_send(message).map_err(|e| match e {
                TrySendError::Full(_) => RealtimeError::QueueFull,
                TrySendError::Closed(_) => RealtimeError::QueueClosed,
            }),
            None => Err(RealtimeError::QueueClosed),
        }
    }

    /// Close the outbound queue, signalling the writer task to drain
    /// and terminate. Idempotent.
    pub(crate) fn close_queue(&self) {
        self.outbound.lock().take();
    }

    /// Snapshot of the advisory room cache.
    pub fn rooms(&self) -> HashSet<RoomName> {
        self.rooms.lock().clone()
    }

    pub(crate) fn cache_join(&self, room: RoomName) {
        self.rooms.lock().insert(room);
    }

    pub(crate) fn cache_leave(&self, room: &RoomName) {
        self.rooms.lock().remove(room);
    }

    pub(crate) fn cache_clear(&self) {
        self.rooms.lock().clear();
    }
}

/// Create a new client with its outbound message receiver.
///
/// The receiver is handed to the connection's writer task; the hub
/// enqueues through the `Client` side.
pub fn create_client() -> (Arc<Client>, ClientReceiver) {
    let (sender, receiver) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let id = uuid::Uuid::new_v4().to_string();
    (Arc::new(Client::new(id, sender)), receiver)
}
