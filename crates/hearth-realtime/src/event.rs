//! Outbound event envelope.

use serde::{Deserialize, Serialize};

use crate::error::RealtimeError;

/// An outbound notification delivered verbatim to every room member.
///
/// Wire shape: `{"type": "<event-name>", "data": <payload>}`. Event
/// names (e.g. `user:updated`, `household:member_left`) are defined by
/// the business layer and are opaque to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type tag.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Arbitrary structured payload.
    pub data: serde_json::Value,
}

impl Event {
    /// Creates a new event.
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// Serializes the event to its wire form.
    pub fn to_json(&self) -> Result<String, RealtimeError> {
        Ok(serde_json::to_string(self)?)
    }
}
