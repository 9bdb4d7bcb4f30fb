use anyhow::{Result, bail};
use axum::extract::ws::Message;
use bytes::Bytes;
use shopcast_core::ServerEnvelope;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::error;
use uuid::Uuid;

/// Server-assigned identity of one accepted WebSocket.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write handle of a client connection.
///
/// Writes are enqueued on an unbounded channel drained by the socket's writer
/// task, so they never block and may be issued under a room lock. Clones share
/// the same channel and the same liveness clock.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
    opened_at: Instant,
    /// Milliseconds after `opened_at` at which the last frame arrived.
    last_seen_ms: Arc<AtomicU64>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: ConnectionId::new(),
            tx,
            opened_at: Instant::now(),
            last_seen_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn send(&self, envelope: &ServerEnvelope) -> bool {
        let json = match envelope.encode() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                return false;
            }
        };
        self.tx.send(Message::Text(json.into())).is_ok()
    }

    /// Records that a frame was received from the client.
    pub fn touch(&self) {
        let elapsed = self.opened_at.elapsed().as_millis() as u64;
        self.last_seen_ms.store(elapsed, Ordering::Relaxed);
    }

    pub fn idle_for(&self) -> Duration {
        let last_seen_ms = self.last_seen_ms.load(Ordering::Relaxed);
        let last_seen = self.opened_at + Duration::from_millis(last_seen_ms);
        Instant::now().saturating_duration_since(last_seen)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Liveness check: enqueues a ping, failing if the writer is gone or the
    /// client has been silent for longer than `timeout`.
    pub fn check_liveness(&self, timeout: Duration) -> Result<()> {
        if self.tx.send(Message::Ping(Bytes::new())).is_err() {
            bail!("writer closed");
        }
        let idle = self.idle_for();
        if idle > timeout {
            bail!("no frames for {:?}", idle);
        }
        Ok(())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}
