//! Streaming HTTP dispatcher configuration.

use serde::{Deserialize, Serialize};

/// Streaming HTTP dispatcher configuration.
///
/// Timeouts apply to the shared client used by every dispatch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// TCP connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub connect_timeout_seconds: u64,
    /// Read timeout between body chunks in seconds.
    #[serde(default = "default_timeout")]
    pub read_timeout_seconds: u64,
    /// Fixed delay before each raw-stream line callback, in milliseconds.
    /// A throttle, not a correctness requirement.
    #[serde(default = "default_throttle")]
    pub stream_throttle_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_timeout(),
            read_timeout_seconds: default_timeout(),
            stream_throttle_ms: default_throttle(),
        }
    }
}

fn default_timeout() -> u64 {
    20
}

fn default_throttle() -> u64 {
    30
}
