use serde::{Deserialize, Serialize};
use shopcast_core::IceServerConfig;
use webrtc::ice_transport::ice_server::RTCIceServer;

pub const DEFAULT_STUN_SERVERS: [&str; 6] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
    "stun:stun2.l.google.com:19302",
    "stun:stun3.l.google.com:19302",
    "stun:stun4.l.google.com:19302",
    "stun:global.stun.twilio.com:3478",
];

/// STUN/TURN servers every media session is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from_stun_urls(DEFAULT_STUN_SERVERS)
    }
}

impl TransportConfig {
    pub fn from_stun_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ice_servers: urls.into_iter().map(IceServerConfig::stun).collect(),
        }
    }

    pub fn with_turn(
        mut self,
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        self.ice_servers.push(IceServerConfig {
            urls: vec![url.into()],
            username: Some(username.into()),
            credential: Some(credential.into()),
        });
        self
    }

    pub(crate) fn rtc_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect()
    }
}
