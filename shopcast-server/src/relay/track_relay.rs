use crate::relay::spawn_forwarder;
use crate::room::{PeerHandle, RoomRegistry};
use crate::transport::{InboundTrack, MediaSession, PacketSink};
use shopcast_core::{
    PeerId, RoomId, ServerEnvelope, ServerMessage, SessionDescriptionPayload,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// Fans a publisher's inbound tracks out to the viewers of its room.
#[derive(Clone)]
pub struct TrackRelay {
    registry: RoomRegistry,
}

impl TrackRelay {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    /// Starts relaying `track`, received on `session` of publisher `publisher_id`.
    ///
    /// The forwarding track is recorded on the publisher and attached to every
    /// current viewer, each of which is then sent a fresh offer. Returns `false`
    /// if the publisher is no longer the room's member with that session.
    pub async fn relay(
        &self,
        room_id: &RoomId,
        publisher_id: &PeerId,
        session: &Arc<dyn MediaSession>,
        track: Arc<dyn InboundTrack>,
        cancel: &CancellationToken,
    ) -> bool {
        let Some(room) = self.registry.get(room_id) else {
            debug!(room = %room_id, "Track from a peer of an unknown room dropped");
            return false;
        };

        let local = Arc::new(TrackLocalStaticRTP::new(
            track.codec(),
            track.id(),
            track.stream_id(),
        ));

        let Some(viewers) = room
            .attach_forwarding_track(publisher_id, session, &local)
            .await
        else {
            debug!(room = %room_id, peer = %publisher_id, "Track from a replaced session dropped");
            return false;
        };

        info!(
            room = %room_id,
            peer = %publisher_id,
            kind = %track.kind(),
            viewers = viewers.len(),
            "Relaying track"
        );

        for viewer in viewers {
            tokio::spawn(renegotiate(room_id.clone(), viewer));
        }

        let sink: Arc<dyn PacketSink> = local;
        spawn_forwarder(track, sink, cancel.child_token());
        true
    }
}

/// Sends `viewer` a new offer so it picks up tracks attached since the last one.
pub async fn renegotiate(room_id: RoomId, viewer: PeerHandle) {
    let sdp = match viewer.session.create_offer().await {
        Ok(sdp) => sdp,
        Err(e) => {
            error!(room = %room_id, peer = %viewer.id, "Renegotiation failed: {:?}", e);
            return;
        }
    };

    let envelope = ServerEnvelope::new(
        room_id,
        Some(viewer.id.clone()),
        ServerMessage::Offer(SessionDescriptionPayload { sdp }),
    );
    if !viewer.connection.send(&envelope) {
        debug!(peer = %viewer.id, "Viewer connection closed before renegotiation offer");
    }
}
