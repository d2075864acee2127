//! WebSocket client session configuration.

use serde::{Deserialize, Serialize};

/// WebSocket client session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsClientConfig {
    /// Per-session outbound channel buffer size.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// How long a closing session waits for the queued close frame to
    /// flush before the writer is torn down, in milliseconds.
    #[serde(default = "default_close_flush")]
    pub close_flush_ms: u64,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            close_flush_ms: default_close_flush(),
        }
    }
}

fn default_channel_buffer() -> usize {
    64
}

fn default_close_flush() -> u64 {
    200
}
