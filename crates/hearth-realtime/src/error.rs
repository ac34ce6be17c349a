//! Error types for the real-time module.

use thiserror::Error;

/// Errors that can occur in real-time operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The client's outbound queue has been closed.
    #[error("outbound queue closed")]
    QueueClosed,

    /// The client's outbound queue is full; the message was dropped.
    #[error("outbound queue full")]
    QueueFull,

    /// The hub control loop is no longer running.
    #[error("hub is not running")]
    HubClosed,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
