use anyhow::Result;
use async_trait::async_trait;
use webrtc::rtp::packet::Packet;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocalWriter;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_remote::TrackRemote;

/// Source side of a relayed track: a publisher's inbound media.
#[async_trait]
pub trait InboundTrack: Send + Sync {
    fn codec(&self) -> RTCRtpCodecCapability;
    fn id(&self) -> String;
    fn stream_id(&self) -> String;
    fn kind(&self) -> RTPCodecType;

    /// Waits for the next RTP packet. An error means the track is finished.
    async fn read_packet(&self) -> Result<Packet>;
}

/// Destination side of a relayed track.
#[async_trait]
pub trait PacketSink: Send + Sync {
    async fn write_packet(&self, packet: &Packet) -> Result<()>;
}

#[async_trait]
impl InboundTrack for TrackRemote {
    fn codec(&self) -> RTCRtpCodecCapability {
        TrackRemote::codec(self).capability
    }

    fn id(&self) -> String {
        TrackRemote::id(self)
    }

    fn stream_id(&self) -> String {
        TrackRemote::stream_id(self)
    }

    fn kind(&self) -> RTPCodecType {
        TrackRemote::kind(self)
    }

    async fn read_packet(&self) -> Result<Packet> {
        let (packet, _) = self.read_rtp().await?;
        Ok(packet)
    }
}

#[async_trait]
impl PacketSink for TrackLocalStaticRTP {
    async fn write_packet(&self, packet: &Packet) -> Result<()> {
        // Errors of every bound viewer come back flattened into one.
        self.write_rtp(packet).await?;
        Ok(())
    }
}
