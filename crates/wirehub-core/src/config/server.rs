//! WebSocket server configuration.

use serde::{Deserialize, Serialize};

/// WebSocket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsServerConfig {
    /// Bind address. Loopback only by default.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port. Port 0 binds an ephemeral port (used by tests).
    #[serde(default = "default_port")]
    pub port: u16,
    /// WebSocket upgrade route.
    #[serde(default = "default_path")]
    pub path: String,
    /// Heartbeat ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// A connection is considered dead when no pong arrives within this
    /// timeout.
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_seconds: u64,
    /// Per-connection outbound channel buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Broadcast stream buffer size.
    #[serde(default = "default_broadcast_buffer")]
    pub broadcast_buffer_size: usize,
    /// Grace period for a graceful stop, in milliseconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
    /// Forced-shutdown deadline after the grace period expires, in
    /// milliseconds.
    #[serde(default = "default_shutdown_deadline")]
    pub shutdown_deadline_ms: u64,
}

impl Default for WsServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            ping_interval_seconds: default_ping_interval(),
            pong_timeout_seconds: default_pong_timeout(),
            channel_buffer_size: default_channel_buffer(),
            broadcast_buffer_size: default_broadcast_buffer(),
            shutdown_grace_ms: default_shutdown_grace(),
            shutdown_deadline_ms: default_shutdown_deadline(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    28230
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_ping_interval() -> u64 {
    10
}

fn default_pong_timeout() -> u64 {
    20
}

fn default_channel_buffer() -> usize {
    64
}

fn default_broadcast_buffer() -> usize {
    256
}

fn default_shutdown_grace() -> u64 {
    1000
}

fn default_shutdown_deadline() -> u64 {
    2000
}
