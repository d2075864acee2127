//! Outbound WebSocket client sessions.

pub mod manager;

pub use manager::WsClientManager;
