//! Room naming.
//!
//! Rooms are identified by names derived deterministically from the
//! owning household's identifier. The fixed `household:` prefix
//! namespaces hub-generated names away from anything a client could
//! supply directly.

use hearth_types::HouseholdId;
use serde::{Deserialize, Serialize};

/// Prefix for household rooms.
pub const HOUSEHOLD_ROOM_PREFIX: &str = "household:";

/// The name of a broadcast room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// Derives the room name for a household: `household:<id>`.
    ///
    /// Pure and deterministic: two clients bound to the same household
    /// always compute the same room name.
    pub fn household(id: &HouseholdId) -> Self {
        Self(format!("{}{}", HOUSEHOLD_ROOM_PREFIX, id))
    }

    /// Returns the room name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
