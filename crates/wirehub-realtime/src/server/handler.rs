//! WebSocket upgrade handler and per-connection read loop.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::State;
use axum::response::Response;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use wirehub_core::SessionId;
use wirehub_core::config::server::WsServerConfig;

use crate::session::handle::{Outbound, SessionHandle, SessionStatus};
use crate::session::registry::SessionRegistry;

use super::heartbeat::{HeartbeatConfig, run_heartbeat};

/// Text sent to every client right after the upgrade.
pub const WELCOME: &str = "Welcome to the Wirehub WebSocket server";

/// Prefix applied to echoed client frames.
pub const ECHO_PREFIX: &str = "echo: ";

/// Shared state for the upgrade handler.
#[derive(Debug, Clone)]
pub(crate) struct WsServerState {
    /// Accepted sessions.
    pub registry: Arc<SessionRegistry>,
    /// Fan-out stream of inbound client text payloads.
    pub broadcast: broadcast::Sender<String>,
    /// Server configuration.
    pub config: Arc<WsServerConfig>,
}

/// GET {path} — WebSocket upgrade.
pub(crate) async fn ws_handler(
    State(state): State<WsServerState>,
    ws: WebSocketUpgrade,
) -> Response {
    // No frame-size cap.
    ws.max_message_size(usize::MAX)
        .max_frame_size(usize::MAX)
        .on_upgrade(move |socket| handle_connection(state, socket))
}

/// Handles an established connection until it closes.
///
/// Text frames are echoed to the originating connection with the
/// `"echo: "` prefix and published once onto the broadcast stream. Close,
/// heartbeat timeout, or a transport error ends the loop without touching
/// the listener or sibling connections; the registry entry is removed on
/// every exit path.
async fn handle_connection(state: WsServerState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel(state.config.channel_buffer_size);

    let handle = Arc::new(SessionHandle::new(SessionId::new(), tx));
    handle.set_status(SessionStatus::Open);
    state.registry.register(handle.clone());

    let session_id = handle.id;
    info!(session_id = %session_id, "client connected");

    // Single writer task fed by the command channel.
    let mut forwarder = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let result = match cmd {
                Outbound::Text(text) => ws_tx.send(Message::Text(text.into())).await,
                Outbound::Ping => ws_tx.send(Message::Ping(Bytes::new())).await,
                Outbound::Close { reason } => {
                    let frame = CloseFrame {
                        code: close_code::NORMAL,
                        reason: reason.into(),
                    };
                    let _ = ws_tx.send(Message::Close(Some(frame))).await;
                    break;
                }
            };
            if result.is_err() {
                break;
            }
        }
    });

    handle.send(Outbound::Text(WELCOME.to_string()));

    let heartbeat = tokio::spawn(run_heartbeat(
        handle.clone(),
        HeartbeatConfig {
            ping_interval: Duration::from_secs(state.config.ping_interval_seconds),
            pong_timeout: Duration::from_secs(state.config.pong_timeout_seconds),
        },
    ));

    let cancel = handle.cancellation_token().clone();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                // Cancellation covers both server stop and a heartbeat
                // cutoff, so the reason names the session, not the server.
                handle.set_status(SessionStatus::Closing);
                handle.send(Outbound::Close {
                    reason: format!("Disconnect {session_id}"),
                });
                break;
            }
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let text = text.to_string();
                    debug!(session_id = %session_id, len = text.len(), "received client frame");
                    handle.send(Outbound::Text(format!("{ECHO_PREFIX}{text}")));
                    // Published once; subscribers active at emission time
                    // each see it, late subscribers get no replay.
                    let _ = state.broadcast.send(text);
                }
                Some(Ok(Message::Pong(_))) => {
                    handle.record_pong().await;
                }
                Some(Ok(Message::Ping(_))) => {
                    // Pong reply is handled by the transport.
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(session_id = %session_id, ?frame, "client closed connection");
                    break;
                }
                Some(Ok(other)) => {
                    debug!(session_id = %session_id, "discarding non-text frame: {other:?}");
                }
                Some(Err(e)) => {
                    warn!(session_id = %session_id, error = %e, "connection error");
                    break;
                }
                None => break,
            }
        }
    }

    heartbeat.abort();

    // Let a queued close frame flush before tearing the writer down.
    let flush = Duration::from_millis(state.config.shutdown_grace_ms.min(250));
    if tokio::time::timeout(flush, &mut forwarder).await.is_err() {
        forwarder.abort();
    }

    handle.set_status(SessionStatus::Closed);
    state.registry.remove(&session_id);
    info!(session_id = %session_id, "client disconnected");
}
