//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod client;
pub mod http;
pub mod logging;
pub mod server;

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::client::WsClientConfig;
use self::http::HttpConfig;
use self::logging::LoggingConfig;
use self::server::WsServerConfig;

use crate::error::NetError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay). Every section has complete
/// defaults, so a missing file yields a fully usable configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebSocket server settings.
    #[serde(default)]
    pub server: WsServerConfig,
    /// WebSocket client session settings.
    #[serde(default)]
    pub client: WsClientConfig,
    /// Streaming HTTP dispatcher settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `WIREHUB`.
    pub fn load(env: &str) -> Result<Self, NetError> {
        debug!(env = %env, "loading configuration");
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WIREHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| NetError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| NetError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_files_falls_back_to_defaults() {
        let config = AppConfig::load("nonexistent").expect("missing files are not an error");
        assert_eq!(config.server.port, 28230);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn defaults_carry_wire_constants() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 28230);
        assert_eq!(config.server.path, "/ws");
        assert_eq!(config.server.ping_interval_seconds, 10);
        assert_eq!(config.server.pong_timeout_seconds, 20);
        assert_eq!(config.http.connect_timeout_seconds, 20);
        assert_eq!(config.http.stream_throttle_ms, 30);
    }
}
