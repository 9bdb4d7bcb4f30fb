use crate::transport::InboundTrack;
use shopcast_core::IceCandidatePayload;
use std::sync::Arc;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

/// Events a media session emits towards its owning peer.
pub enum SessionEvent {
    /// Locally gathered ICE candidate, to be sent to the client.
    LocalCandidate(IceCandidatePayload),

    /// The remote side started sending a track.
    Track(Arc<dyn InboundTrack>),

    StateChanged(RTCPeerConnectionState),
}
