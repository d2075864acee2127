//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{debug, warn};

use crate::session::handle::{Outbound, SessionHandle, SessionStatus};

/// Heartbeat configuration.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Timeout before considering the connection dead.
    pub pong_timeout: Duration,
}

/// Run the heartbeat loop for a connection.
///
/// Sends periodic pings and checks for pong responses. Cancels the session
/// if no pong arrives within the timeout, which makes its read loop exit
/// and clean up.
pub async fn run_heartbeat(handle: Arc<SessionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);

    loop {
        interval.tick().await;

        if handle.status() == SessionStatus::Closed {
            break;
        }

        let elapsed = Utc::now() - handle.last_pong().await;
        if let Ok(elapsed_std) = elapsed.to_std() {
            if elapsed_std > config.pong_timeout {
                warn!(
                    session_id = %handle.id,
                    ?elapsed_std,
                    "heartbeat timeout, cancelling session"
                );
                handle.cancel();
                break;
            }
        }

        if !handle.send(Outbound::Ping) {
            debug!(session_id = %handle.id, "ping send failed, cancelling session");
            handle.cancel();
            break;
        }
    }

    debug!(session_id = %handle.id, "heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use wirehub_core::SessionId;

    fn open_handle(capacity: usize) -> (Arc<SessionHandle>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Arc::new(SessionHandle::new(SessionId::new(), tx));
        handle.set_status(SessionStatus::Open);
        (handle, rx)
    }

    #[tokio::test]
    async fn stale_pong_cancels_the_session() {
        let (handle, mut rx) = open_handle(64);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let heartbeat = tokio::spawn(run_heartbeat(
            handle.clone(),
            HeartbeatConfig {
                ping_interval: Duration::from_millis(5),
                pong_timeout: Duration::from_millis(20),
            },
        ));

        tokio::time::timeout(
            Duration::from_secs(2),
            handle.cancellation_token().cancelled(),
        )
        .await
        .expect("session with no pongs should be cancelled");

        heartbeat.await.unwrap();
        drain.abort();
    }

    #[tokio::test]
    async fn fresh_pongs_keep_the_session_alive() {
        let (handle, mut rx) = open_handle(64);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let heartbeat = tokio::spawn(run_heartbeat(
            handle.clone(),
            HeartbeatConfig {
                ping_interval: Duration::from_millis(5),
                pong_timeout: Duration::from_millis(50),
            },
        ));

        for _ in 0..20 {
            handle.record_pong().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!handle.cancellation_token().is_cancelled());

        handle.set_status(SessionStatus::Closed);
        tokio::time::timeout(Duration::from_secs(2), heartbeat)
            .await
            .expect("heartbeat should exit once the session is closed")
            .unwrap();
        drain.abort();
    }
}
