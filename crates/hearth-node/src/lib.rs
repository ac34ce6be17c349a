//! # Hearth Node
//!
//! The server binary for Hearth's realtime notification service. It
//! wires the pieces together:
//!
//! - [`config`]: listen address, logging, and WebSocket tunables
//! - [`api`]: the HTTP router (health, hub statistics)
//! - [`ws_api`]: the `/ws` endpoint and per-connection tasks
//! - [`observability`]: structured logging via `tracing`
//!
//! The hub itself lives in the `hearth-realtime` crate and credential
//! verification in `hearth-auth`; this crate only hosts them behind
//! axum.

pub mod api;
pub mod config;
pub mod observability;
pub mod ws_api;
