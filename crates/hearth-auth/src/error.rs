//! Error types for credential handling.

use thiserror::Error;

/// Errors that can occur while issuing or verifying credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token string does not match the expected format.
    #[error("invalid token format")]
    InvalidTokenFormat,

    /// Token is unknown or its secret does not verify.
    #[error("invalid credential")]
    InvalidCredential,

    /// Token exists but has expired.
    #[error("credential expired")]
    CredentialExpired,

    /// Cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;
