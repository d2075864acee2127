//! Individual WebSocket session handle.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use wirehub_core::SessionId;

/// Lifecycle status of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Handshake in flight.
    Connecting,
    /// Connected and pumping frames.
    Open,
    /// Close requested, waiting for the close frame to flush.
    Closing,
    /// Terminal. The registry entry is gone.
    Closed,
}

impl SessionStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }
}

/// Outbound command for the socket's single writer task.
///
/// The write half of each socket is owned by exactly one forwarder task fed
/// by this channel; every other task talks to the socket through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A text frame.
    Text(String),
    /// A heartbeat ping frame.
    Ping,
    /// A normal-closure frame. The forwarder sends it and stops.
    Close {
        /// Close reason carried in the frame.
        reason: String,
    },
}

/// A handle to a single WebSocket session.
///
/// Holds the sender channel for pushing commands to the socket writer, the
/// session's one cancellation token, and its lifecycle status. The handle
/// is shared via `Arc`; the registry entry owns the canonical reference
/// until removal.
#[derive(Debug)]
pub struct SessionHandle {
    /// Unique session ID.
    pub id: SessionId,
    /// Sender for outbound commands.
    sender: mpsc::Sender<Outbound>,
    /// Lifecycle status.
    status: AtomicU8,
    /// The session's cancellation token. Exactly one per session ID.
    cancel: CancellationToken,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last pong received (server-side heartbeat bookkeeping).
    last_pong: tokio::sync::RwLock<DateTime<Utc>>,
}

impl SessionHandle {
    /// Create a new handle in `Connecting` status.
    pub fn new(id: SessionId, sender: mpsc::Sender<Outbound>) -> Self {
        let now = Utc::now();
        Self {
            id,
            sender,
            status: AtomicU8::new(SessionStatus::Connecting.as_u8()),
            cancel: CancellationToken::new(),
            created_at: now,
            last_pong: tokio::sync::RwLock::new(now),
        }
    }

    /// Queue an outbound command without blocking.
    ///
    /// Returns `false` if the command was dropped (buffer full or writer
    /// gone). A gone writer marks the session closed.
    pub fn send(&self, cmd: Outbound) -> bool {
        match self.sender.try_send(cmd) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.id, "session send buffer full, dropping command");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.set_status(SessionStatus::Closed);
                false
            }
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Record a lifecycle transition.
    pub fn set_status(&self, status: SessionStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    /// Whether the session is connected and pumping frames.
    pub fn is_open(&self) -> bool {
        self.status() == SessionStatus::Open
    }

    /// Cancel the session's owning task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The session's cancellation token, for `select!`ing in read loops.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Record a pong response.
    pub async fn record_pong(&self) {
        let mut lp = self.last_pong.write().await;
        *lp = Utc::now();
    }

    /// Timestamp of the last pong received.
    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_buffer(capacity: usize) -> (SessionHandle, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (SessionHandle::new(SessionId::new(), tx), rx)
    }

    #[tokio::test]
    async fn starts_connecting_and_transitions() {
        let (handle, _rx) = handle_with_buffer(4);
        assert_eq!(handle.status(), SessionStatus::Connecting);
        handle.set_status(SessionStatus::Open);
        assert!(handle.is_open());
        handle.set_status(SessionStatus::Closed);
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn send_to_dropped_writer_marks_closed() {
        let (handle, rx) = handle_with_buffer(4);
        drop(rx);
        assert!(!handle.send(Outbound::Ping));
        assert_eq!(handle.status(), SessionStatus::Closed);
    }

    #[tokio::test]
    async fn full_buffer_drops_without_closing() {
        let (handle, _rx) = handle_with_buffer(1);
        assert!(handle.send(Outbound::Ping));
        assert!(!handle.send(Outbound::Ping));
        assert_ne!(handle.status(), SessionStatus::Closed);
    }
}
