//! Verified identity bound to a connection.

use crate::id::{HouseholdId, UserId};
use serde::{Deserialize, Serialize};

/// A verified identity: the subject and the group it belongs to.
///
/// Produced by the credential verifier; once bound to a connection it
/// is immutable for the connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The authenticated user.
    pub user_id: UserId,
    /// The household the user belongs to.
    pub household_id: HouseholdId,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(user_id: impl Into<UserId>, household_id: impl Into<HouseholdId>) -> Self {
        Self {
            user_id: user_id.into(),
            household_id: household_id.into(),
        }
    }
}
