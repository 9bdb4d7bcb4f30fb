use anyhow::Result;
use async_trait::async_trait;
use shopcast_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Receives the number of viewers of a room whenever it changes.
#[async_trait]
pub trait ViewerCountSink: Send + Sync {
    async fn update_viewer_count(&self, room_id: &RoomId, count: usize) -> Result<()>;
}

/// Sink that only logs the count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogViewerCount;

#[async_trait]
impl ViewerCountSink for LogViewerCount {
    async fn update_viewer_count(&self, room_id: &RoomId, count: usize) -> Result<()> {
        info!(room = %room_id, viewers = count, "Viewer count updated");
        Ok(())
    }
}

/// Ordered queue in front of a [`ViewerCountSink`].
///
/// Rooms enqueue a count while still holding their lock, and a single task
/// delivers them, so the sink sees every room's counts in the order the
/// membership changes happened. Enqueueing never blocks.
#[derive(Clone)]
pub struct ViewerCountReporter {
    tx: mpsc::UnboundedSender<(RoomId, usize)>,
}

impl ViewerCountReporter {
    /// Starts the delivery task. It stops once every reporter clone is dropped.
    pub fn spawn(sink: Arc<dyn ViewerCountSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(RoomId, usize)>();

        tokio::spawn(async move {
            while let Some((room_id, count)) = rx.recv().await {
                if let Err(e) = sink.update_viewer_count(&room_id, count).await {
                    warn!(room = %room_id, "Failed to update viewer count: {:?}", e);
                }
            }
            debug!("Viewer count reporter stopped");
        });

        Self { tx }
    }

    pub fn report(&self, room_id: &RoomId, count: usize) {
        if self.tx.send((room_id.clone(), count)).is_err() {
            debug!(room = %room_id, "Viewer count reporter gone, update dropped");
        }
    }
}
