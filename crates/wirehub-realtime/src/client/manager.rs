//! Client-side WebSocket session manager.
//!
//! Each `connect` spawns an independent task that performs the handshake,
//! announces its session ID to the remote, and pumps inbound text frames to
//! the caller's callback. Failures are per-session: a read-loop error cleans
//! up its own registry entry and never reaches the `connect` caller or any
//! sibling session.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};

use wirehub_core::config::client::WsClientConfig;
use wirehub_core::{NetError, NetResult, SessionId};

use crate::session::handle::{Outbound, SessionHandle, SessionStatus};
use crate::session::registry::SessionRegistry;

/// Manages outbound WebSocket sessions.
#[derive(Debug)]
pub struct WsClientManager {
    /// Live sessions keyed by ID.
    registry: Arc<SessionRegistry>,
    /// Configuration.
    config: WsClientConfig,
}

impl WsClientManager {
    /// Creates a new client manager.
    pub fn new(config: WsClientConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            config,
        }
    }

    /// Opens a new session to `url` and returns its ID immediately.
    ///
    /// The ID is generated and registered before the handshake completes,
    /// so the caller can reference (and disconnect) the session right away.
    /// Inbound text frames are delivered to `on_message` in arrival order;
    /// other frame kinds are logged and discarded.
    pub fn connect<F>(&self, url: impl Into<String>, on_message: F) -> SessionId
    where
        F: Fn(String) + Send + 'static,
    {
        let url = url.into();
        let id = SessionId::new();
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(SessionHandle::new(id, tx));

        self.registry.register(handle.clone());
        info!(session_id = %id, url = %url, "opening WebSocket session");

        let registry = self.registry.clone();
        let close_flush = Duration::from_millis(self.config.close_flush_ms);
        tokio::spawn(async move {
            match run_session(&handle, rx, &url, on_message, close_flush).await {
                Ok(()) => info!(session_id = %id, "session closed"),
                Err(e) if e.is_cancelled() => debug!(session_id = %id, "session cancelled"),
                Err(e) => warn!(session_id = %id, error = %e, "session failed"),
            }
            // Cleanup runs on every exit path: explicit disconnect, remote
            // close, handshake failure, transport error, or cancellation.
            handle.set_status(SessionStatus::Closed);
            registry.remove(&id);
        });

        id
    }

    /// Queues a text frame on a live session.
    ///
    /// Returns `false` if the session is unknown or its writer is gone.
    pub fn send_text(&self, id: &SessionId, text: impl Into<String>) -> bool {
        match self.registry.lookup(id) {
            Some(handle) => handle.send(Outbound::Text(text.into())),
            None => {
                warn!(session_id = %id, "no active session for send");
                false
            }
        }
    }

    /// Closes one session gracefully.
    ///
    /// Sends a normal-closure frame with reason `Disconnect <id>`, removes
    /// the registry entry, and cancels the owning task. Disconnecting an
    /// unknown ID is logged and is not an error.
    pub fn disconnect(&self, id: &SessionId) {
        match self.registry.remove(id) {
            Some(handle) => {
                handle.set_status(SessionStatus::Closing);
                handle.send(Outbound::Close {
                    reason: format!("Disconnect {id}"),
                });
                handle.cancel();
                info!(session_id = %id, "session disconnect requested");
            }
            None => {
                warn!(session_id = %id, "no active session for disconnect");
            }
        }
    }

    /// Closes every tracked session.
    ///
    /// Each session gets the same graceful close frame as [`disconnect`]
    /// before its task is cancelled. The manager itself stays usable and
    /// can open new sessions afterwards.
    ///
    /// [`disconnect`]: Self::disconnect
    pub fn close_all_sessions(&self) {
        let handles = self.registry.remove_all();
        let count = handles.len();
        for handle in handles {
            handle.set_status(SessionStatus::Closing);
            handle.send(Outbound::Close {
                reason: format!("Disconnect {}", handle.id),
            });
            handle.cancel();
        }
        info!(count, "closed all client sessions");
    }

    /// Number of tracked sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// The underlying session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

/// Drives one session from handshake to teardown.
async fn run_session<F>(
    handle: &Arc<SessionHandle>,
    mut rx: mpsc::Receiver<Outbound>,
    url: &str,
    on_message: F,
    close_flush: Duration,
) -> NetResult<()>
where
    F: Fn(String) + Send + 'static,
{
    let cancel = handle.cancellation_token().clone();

    let ws_stream = tokio::select! {
        _ = cancel.cancelled() => {
            return Err(NetError::cancelled("cancelled before handshake"));
        }
        result = connect_async(url) => {
            let (ws_stream, _) = result
                .map_err(|e| NetError::with_source(
                    wirehub_core::ErrorKind::Connection,
                    format!("handshake with {url} failed"),
                    e,
                ))?;
            ws_stream
        }
    };

    handle.set_status(SessionStatus::Open);
    debug!(session_id = %handle.id, "handshake complete");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // Single writer task; everything outbound goes through the command
    // channel. A close command is sent and then the writer stops.
    let mut forwarder = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let result = match cmd {
                Outbound::Text(text) => ws_tx.send(Message::text(text)).await,
                Outbound::Ping => ws_tx.send(Message::Ping(Bytes::new())).await,
                Outbound::Close { reason } => {
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
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

    // Announce the session ID as the first frame.
    let hello = serde_json::json!({ "session_id": handle.id.to_string() }).to_string();
    handle.send(Outbound::Text(hello));

    let outcome = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break Ok(());
            }
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    debug!(session_id = %handle.id, len = text.len(), "received text frame");
                    on_message(text.to_string());
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(session_id = %handle.id, ?frame, "remote closed session");
                    break Ok(());
                }
                Some(Ok(other)) => {
                    debug!(session_id = %handle.id, "discarding non-text frame: {other:?}");
                }
                Some(Err(e)) => {
                    break Err(NetError::with_source(
                        wirehub_core::ErrorKind::Connection,
                        "session read failed",
                        e,
                    ));
                }
                None => {
                    break Ok(());
                }
            }
        }
    };

    // Let a queued close frame flush before tearing the writer down.
    if tokio::time::timeout(close_flush, &mut forwarder).await.is_err() {
        forwarder.abort();
    }

    outcome
}
