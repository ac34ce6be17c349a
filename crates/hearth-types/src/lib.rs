//! Common types used throughout `hearth`.
//!
//! This crate provides the core identifier and identity types shared
//! by the Hearth household task-tracking service.

mod id;
mod identity;

pub use id::{HouseholdId, UserId};
pub use identity::Identity;
