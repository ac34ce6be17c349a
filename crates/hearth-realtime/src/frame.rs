//! Inbound control frames.
//!
//! Each discrete text message from a connection is decoded as one of
//! the typed control requests below. Anything that fails to decode is
//! ignored without terminating the connection.

use hearth_types::HouseholdId;
use serde::Deserialize;

/// A typed control request decoded from an inbound frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ControlFrame {
    /// In-band authentication: `{"type":"auth","token":"..."}`.
    #[serde(rename = "auth")]
    Auth {
        /// Opaque credential string.
        token: String,
    },

    /// Join a household room: `{"type":"join:household","householdId":"..."}`.
    #[serde(rename = "join:household")]
    JoinHousehold {
        /// Requested scope; honored only if it matches the bound identity.
        #[serde(rename = "householdId")]
        household_id: HouseholdId,
    },

    /// Leave a household room: `{"type":"leave:household","householdId":"..."}`.
    #[serde(rename = "leave:household")]
    LeaveHousehold {
        /// Requested scope; honored only if it matches the bound identity.
        #[serde(rename = "householdId")]
        household_id: HouseholdId,
    },
}

impl ControlFrame {
    /// Decodes a frame, returning `None` for malformed or unknown input.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}
