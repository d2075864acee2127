//! # wirehub-realtime
//!
//! WebSocket session transport for Wirehub. Provides:
//!
//! - Concurrency-safe session registry with keyed cancellation
//! - Outbound client session manager with per-session read loops
//! - Owned echo/broadcast WebSocket server with heartbeat and graceful stop
//!
//! Every session runs as an independent task: a read-loop failure is
//! isolated, logged, and cleans up its own registry entry without touching
//! sibling sessions, the manager, or the listener.

pub mod client;
pub mod server;
pub mod session;

pub use client::WsClientManager;
pub use server::WsServerManager;
pub use session::handle::{Outbound, SessionHandle, SessionStatus};
pub use session::registry::SessionRegistry;
