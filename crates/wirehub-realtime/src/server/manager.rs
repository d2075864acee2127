//! Owned WebSocket server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use wirehub_core::config::server::WsServerConfig;
use wirehub_core::{NetError, NetResult};

use crate::session::registry::SessionRegistry;

use super::handler::{WsServerState, ws_handler};

/// A running listener.
#[derive(Debug)]
struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Explicitly owned WebSocket echo/broadcast server.
///
/// Constructed by the composing application and lifecycled through
/// [`start`]/[`stop`]; start/stop transitions are serialized, so concurrent
/// invocations cannot race the listener.
///
/// [`start`]: Self::start
/// [`stop`]: Self::stop
#[derive(Debug)]
pub struct WsServerManager {
    /// Configuration.
    config: Arc<WsServerConfig>,
    /// Accepted sessions.
    registry: Arc<SessionRegistry>,
    /// Fan-out stream of inbound client text payloads.
    broadcast: broadcast::Sender<String>,
    /// Current listener, if running.
    lifecycle: Mutex<Option<RunningServer>>,
}

impl WsServerManager {
    /// Creates a new, idle server manager.
    pub fn new(config: WsServerConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer_size);
        Self {
            config: Arc::new(config),
            registry: Arc::new(SessionRegistry::new()),
            broadcast: broadcast_tx,
            lifecycle: Mutex::new(None),
        }
    }

    /// Starts the listener and returns the bound address.
    ///
    /// If an instance is already running it is stopped first, so repeated
    /// calls behave as an idempotent restart.
    pub async fn start(&self) -> NetResult<SocketAddr> {
        let mut guard = self.lifecycle.lock().await;

        if let Some(running) = guard.take() {
            info!("server already running, restarting");
            self.shutdown(running).await;
        }

        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            NetError::with_source(
                wirehub_core::ErrorKind::Connection,
                format!("failed to bind {bind_addr}"),
                e,
            )
        })?;
        let addr = listener.local_addr().map_err(|e| {
            NetError::with_source(wirehub_core::ErrorKind::Internal, "no local address", e)
        })?;

        let state = WsServerState {
            registry: self.registry.clone(),
            broadcast: self.broadcast.clone(),
            config: self.config.clone(),
        };
        let app = Router::new()
            .route(&self.config.path, get(ws_handler))
            .with_state(state);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        });

        let join = tokio::spawn(async move {
            if let Err(e) = server.await {
                error!(error = %e, "WebSocket server error");
            }
        });

        info!(%addr, path = %self.config.path, "WebSocket server listening");

        *guard = Some(RunningServer {
            addr,
            shutdown_tx,
            join,
        });
        Ok(addr)
    }

    /// Stops the listener.
    ///
    /// Requests a graceful stop and waits up to the configured grace period,
    /// then aborts at the forced-shutdown deadline. Calling this when the
    /// server is not running is a quiet no-op.
    pub async fn stop(&self) {
        let mut guard = self.lifecycle.lock().await;
        match guard.take() {
            Some(running) => self.shutdown(running).await,
            None => debug!("stop requested but server is not running"),
        }
    }

    /// Subscribes to the broadcast stream of inbound client payloads.
    ///
    /// Delivery starts at subscription time; there is no replay buffer.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcast.subscribe()
    }

    /// Whether a listener is currently running.
    pub async fn is_running(&self) -> bool {
        self.lifecycle.lock().await.is_some()
    }

    /// The bound address of the running listener, if any.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.lock().await.as_ref().map(|r| r.addr)
    }

    /// Number of currently accepted sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Tears one running listener down.
    async fn shutdown(&self, running: RunningServer) {
        // Drain and cancel accepted sessions first; each read loop sends the
        // close frame on its way out.
        for handle in self.registry.remove_all() {
            handle.cancel();
        }

        let _ = running.shutdown_tx.send(true);

        let RunningServer { addr, mut join, .. } = running;
        let grace = Duration::from_millis(self.config.shutdown_grace_ms);
        let deadline = Duration::from_millis(self.config.shutdown_deadline_ms);

        if tokio::time::timeout(grace, &mut join).await.is_err() {
            warn!(%addr, "graceful stop timed out, aborting listener");
            join.abort();
            let _ = tokio::time::timeout(deadline, join).await;
        }

        info!(%addr, "WebSocket server stopped");
    }
}
