//! Node configuration types.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the Hearth node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP/WebSocket listen address.
    pub listen_addr: SocketAddr,
    /// Log level.
    pub log_level: String,
    /// Emit logs as JSON.
    pub log_json: bool,
    /// WebSocket endpoint settings.
    pub websocket: WsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            log_json: false,
            websocket: WsConfig::default(),
        }
    }
}

/// Settings for the `/ws` endpoint and per-connection tasks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WsConfig {
    /// Whether the `/ws` route is mounted at all.
    pub enabled: bool,
    /// Keepalive ping interval when the outbound queue is idle.
    pub keepalive_interval_secs: u64,
    /// How long a connection may stay silent before the reader gives up.
    pub idle_read_timeout_secs: u64,
    /// Bound on a single socket write.
    pub write_timeout_secs: u64,
    /// Maximum accepted inbound frame size in bytes.
    pub max_frame_bytes: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keepalive_interval_secs: 45,
            idle_read_timeout_secs: 60,
            write_timeout_secs: 10,
            max_frame_bytes: 1 << 20,
        }
    }
}

impl WsConfig {
    /// Keepalive ping interval.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    /// Idle read timeout. Refreshed by any inbound frame, including
    /// pong replies to keepalive pings.
    pub fn idle_read_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_read_timeout_secs)
    }

    /// Per-write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
