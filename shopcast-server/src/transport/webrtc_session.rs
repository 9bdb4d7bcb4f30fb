use crate::transport::{
    InboundTrack, MediaSession, SessionEvent, SessionFactory, TransportConfig,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use shopcast_core::{IceCandidatePayload, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_remote::TrackRemote;

/// [`MediaSession`] backed by a `webrtc` peer connection.
pub struct WebRtcSession {
    pub peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcSession {
    /// Builds the peer connection and wires its callbacks into `events`.
    pub async fn new(
        peer_id: PeerId,
        config: &TransportConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.rtc_ice_servers(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = events.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!(peer = %uid, state = %s, "Peer connection state changed");
                    let _ = tx.send(SessionEvent::StateChanged(s)).await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(SessionEvent::LocalCandidate(candidate_payload(init)))
                    .await;
            })
        }));

        let track_tx = events;
        let uid_track = peer_id.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    debug!(
                        peer = %uid,
                        kind = %track.kind(),
                        track = %track.id(),
                        "Inbound track"
                    );
                    let track: Arc<dyn InboundTrack> = track;
                    let _ = tx.send(SessionEvent::Track(track)).await;
                })
            },
        ));

        Ok(Self {
            peer_id,
            peer_connection,
        })
    }
}

#[async_trait]
impl MediaSession for WebRtcSession {
    async fn accept_offer(&self, sdp: String) -> Result<String> {
        let offer = RTCSessionDescription::offer(sdp).context("Invalid SDP offer")?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .context("Failed to set remote description")?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(answer.sdp)
    }

    async fn create_offer(&self) -> Result<String> {
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

    async fn accept_answer(&self, sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp).context("Invalid SDP answer")?;
        self.peer_connection
            .set_remote_description(answer)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidatePayload) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(candidate_init(candidate))
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn add_track(&self, track: Arc<TrackLocalStaticRTP>) -> Result<()> {
        let sender = self
            .peer_connection
            .add_track(track as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add track")?;

        // RTCP has to be read for interceptors (NACK, reports) to run.
        let peer_id = self.peer_id.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
            debug!(peer = %peer_id, "RTCP reader finished");
        });
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates a [`WebRtcSession`] per joining peer.
#[derive(Clone, Default)]
pub struct WebRtcSessionFactory {
    config: TransportConfig,
}

impl WebRtcSessionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for WebRtcSessionFactory {
    async fn create(
        &self,
        peer_id: &PeerId,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn MediaSession>> {
        let session = WebRtcSession::new(peer_id.clone(), &self.config, events)
            .await
            .inspect_err(|e| warn!(peer = %peer_id, "Media session setup failed: {:?}", e))?;
        Ok(Arc::new(session))
    }
}

fn candidate_payload(init: RTCIceCandidateInit) -> IceCandidatePayload {
    IceCandidatePayload {
        candidate: init.candidate,
        sdp_mline_index: init.sdp_mline_index,
        sdp_mid: init.sdp_mid,
        username_fragment: init.username_fragment,
    }
}

fn candidate_init(payload: IceCandidatePayload) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: payload.candidate,
        sdp_mid: payload.sdp_mid,
        sdp_mline_index: payload.sdp_mline_index,
        username_fragment: payload.username_fragment,
    }
}
