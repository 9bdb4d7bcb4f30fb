use anyhow::{Context, Result};
use std::sync::Arc;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_VP8, MediaEngine};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

use shopcast_core::PeerId;

/// Browser stand-in backed by a real `webrtc` peer connection.
pub struct TestClient {
    pub peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl TestClient {
    /// Creates a client without STUN servers, for loopback tests.
    pub async fn new(peer_id: PeerId) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(RTCConfiguration::default())
                .await?,
        );

        Ok(Self {
            peer_id,
            peer_connection,
        })
    }

    /// Adds an outgoing VP8 track, as a seller's camera would.
    pub async fn add_video_track(&self) -> Result<Arc<TrackLocalStaticRTP>> {
        let track = Arc::new(TrackLocalStaticRTP::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            "camera".to_owned(),
            self.peer_id.to_string(),
        ));
        self.peer_connection
            .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add track")?;
        Ok(track)
    }

    /// Adds a receive-only video transceiver, as a viewer would.
    pub async fn receive_video(&self) -> Result<()> {
        self.peer_connection
            .add_transceiver_from_kind(
                RTPCodecType::Video,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .context("Failed to add transceiver")?;
        Ok(())
    }

    /// Creates an SDP offer and sets it as the local description.
    pub async fn create_offer(&self) -> Result<String> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;

        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local description")?;

        Ok(offer.sdp)
    }

    /// Set the remote SDP answer received from the server.
    pub async fn set_remote_answer(&self, sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection
            .set_remote_description(answer)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        tracing::debug!("[TestClient] Dropping client {}", self.peer_id);
    }
}
