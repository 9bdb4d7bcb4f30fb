use crate::transport::SessionEvent;
use anyhow::Result;
use async_trait::async_trait;
use shopcast_core::{IceCandidatePayload, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// One negotiated media session with a remote endpoint.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Applies a remote offer and returns the local answer SDP.
    async fn accept_offer(&self, sdp: String) -> Result<String>;

    /// Creates a local offer (used for renegotiation) and returns its SDP.
    async fn create_offer(&self) -> Result<String>;

    async fn accept_answer(&self, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidatePayload) -> Result<()>;

    /// Attaches an outbound track; the remote side learns about it on the next offer.
    async fn add_track(&self, track: Arc<TrackLocalStaticRTP>) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: &PeerId,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn MediaSession>>;
}
