use crate::signaling::Connection;
use crate::transport::MediaSession;
use shopcast_core::{PeerId, Role};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// A member of a room: its connection, its media session and, for a
/// publisher, the local tracks its inbound media is forwarded through.
pub struct PeerSession {
    pub id: PeerId,
    pub role: Role,
    pub connection: Connection,
    pub session: Arc<dyn MediaSession>,
    pub forwarding: Vec<Arc<TrackLocalStaticRTP>>,
    cancel: CancellationToken,
}

impl PeerSession {
    pub fn new(
        id: PeerId,
        role: Role,
        connection: Connection,
        session: Arc<dyn MediaSession>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            role,
            connection,
            session,
            forwarding: Vec::new(),
            cancel,
        }
    }

    pub fn is_publisher(&self) -> bool {
        self.role == Role::Publisher
    }

    /// Token bounding every task spawned on behalf of this session.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether `session` is the media session this peer owns.
    pub fn owns(&self, session: &Arc<dyn MediaSession>) -> bool {
        Arc::ptr_eq(&self.session, session)
    }

    /// Stops the session's tasks and closes the media session.
    ///
    /// Must not be called while the room lock is held.
    pub async fn close(self) {
        self.cancel.cancel();
        match self.session.close().await {
            Ok(()) => debug!(peer = %self.id, "Media session closed"),
            Err(e) => warn!(peer = %self.id, "Failed to close media session: {:?}", e),
        }
    }
}
