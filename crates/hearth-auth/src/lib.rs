//! # Hearth Auth
//!
//! Credential issuance and verification for the Hearth realtime layer.
//!
//! The realtime hub never interprets credentials itself; it delegates
//! to a [`CredentialVerifier`], which maps an opaque token string to a
//! verified [`hearth_types::Identity`] or rejects it. This crate
//! provides that contract plus an in-memory [`TokenStore`]
//! implementation backed by argon2id-hashed access tokens.
//!
//! ## Token format
//!
//! ```text
//! hearth_<prefix>_<secret>
//! ```
//!
//! The 8-character prefix is stored in plaintext for lookup; only an
//! argon2id hash of the 32-character secret is retained.

pub mod error;
pub mod store;
pub mod token;

pub use error::{AuthError, Result};
pub use store::{CredentialVerifier, TokenStore};
pub use token::TokenValue;
