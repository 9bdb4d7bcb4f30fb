use crate::error::EnvelopeError;
use crate::model::peer::{PeerId, Role};
use crate::model::room::RoomId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Value of the `type` field of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Join,
    Joined,
    Offer,
    Answer,
    #[serde(alias = "ice-candidate")]
    Ice,
    Chat,
    Reaction,
    SellerLive,
    SellerOffline,
    UserJoined,
    UserLeft,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Join => "join",
            MessageKind::Joined => "joined",
            MessageKind::Offer => "offer",
            MessageKind::Answer => "answer",
            MessageKind::Ice => "ice",
            MessageKind::Chat => "chat",
            MessageKind::Reaction => "reaction",
            MessageKind::SellerLive => "seller_live",
            MessageKind::SellerOffline => "seller_offline",
            MessageKind::UserJoined => "user_joined",
            MessageKind::UserLeft => "user_left",
        };
        f.write_str(s)
    }
}

/// Untyped form of an envelope, exactly as it travels over the socket.
///
/// Only used at the boundary: [`Envelope`] and [`ServerEnvelope`] are what the
/// rest of the system handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEnvelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub data: Value,
    pub room: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<PeerId>,
    /// Sender of a relayed chat message or reaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PeerId>,
}

/// Room-wide messages the server relays without interpreting `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Chat,
    Reaction,
    SellerLive,
    SellerOffline,
}

impl BroadcastKind {
    pub fn kind(self) -> MessageKind {
        match self {
            BroadcastKind::Chat => MessageKind::Chat,
            BroadcastKind::Reaction => MessageKind::Reaction,
            BroadcastKind::SellerLive => MessageKind::SellerLive,
            BroadcastKind::SellerOffline => MessageKind::SellerOffline,
        }
    }

    fn from_kind(kind: MessageKind) -> Option<Self> {
        match kind {
            MessageKind::Chat => Some(BroadcastKind::Chat),
            MessageKind::Reaction => Some(BroadcastKind::Reaction),
            MessageKind::SellerLive => Some(BroadcastKind::SellerLive),
            MessageKind::SellerOffline => Some(BroadcastKind::SellerOffline),
            _ => None,
        }
    }

    /// Chat and reactions go to the whole room, sender included, tagged with
    /// who sent them. Seller status notices go to everyone else, untagged.
    pub fn is_social(self) -> bool {
        matches!(self, BroadcastKind::Chat | BroadcastKind::Reaction)
    }
}

impl fmt::Display for BroadcastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptionPayload {
    pub sdp: String,
}

/// Browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidatePayload {
    pub candidate: String,
    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,
    #[serde(default, rename = "sdpMid", skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        default,
        rename = "usernameFragment",
        skip_serializing_if = "Option::is_none"
    )]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JoinData {
    #[serde(default)]
    client_id: Option<PeerId>,
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JoinedData {
    status: String,
    client_id: PeerId,
}

#[derive(Debug, Serialize, Deserialize)]
struct PresenceData {
    client_id: PeerId,
}

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join { client_id: PeerId, role: Role },
    Offer(SessionDescriptionPayload),
    Answer(SessionDescriptionPayload),
    Ice(IceCandidatePayload),
    Broadcast { kind: BroadcastKind, data: Value },
}

impl ClientMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ClientMessage::Join { .. } => MessageKind::Join,
            ClientMessage::Offer(_) => MessageKind::Offer,
            ClientMessage::Answer(_) => MessageKind::Answer,
            ClientMessage::Ice(_) => MessageKind::Ice,
            ClientMessage::Broadcast { kind, .. } => kind.kind(),
        }
    }
}

/// A decoded client envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub room: RoomId,
    /// Addressed peer. `None` means "whichever peer this connection joined as".
    pub client_id: Option<PeerId>,
    pub message: ClientMessage,
}

impl Envelope {
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope = serde_json::from_str(text)?;
        Self::try_from(wire)
    }
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        if wire.room.as_str().is_empty() {
            return Err(EnvelopeError::MissingField("room"));
        }

        let message = match wire.kind {
            MessageKind::Join => {
                let data: JoinData = payload(wire.data)?;
                let client_id = data
                    .client_id
                    .or_else(|| wire.client_id.clone())
                    .filter(|id| !id.as_str().is_empty())
                    .ok_or(EnvelopeError::MissingField("client_id"))?;
                let role = data
                    .role
                    .or(wire.role)
                    .ok_or(EnvelopeError::MissingField("role"))?;
                ClientMessage::Join { client_id, role }
            }
            MessageKind::Offer => ClientMessage::Offer(payload(wire.data)?),
            MessageKind::Answer => ClientMessage::Answer(payload(wire.data)?),
            MessageKind::Ice => ClientMessage::Ice(payload(wire.data)?),
            kind => match BroadcastKind::from_kind(kind) {
                Some(kind) => ClientMessage::Broadcast {
                    kind,
                    data: wire.data,
                },
                None => return Err(EnvelopeError::UnexpectedType(kind)),
            },
        };

        let client_id = match &message {
            ClientMessage::Join { client_id, .. } => Some(client_id.clone()),
            _ => wire.client_id,
        };

        Ok(Self {
            room: wire.room,
            client_id,
            message,
        })
    }
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Joined { client_id: PeerId },
    Offer(SessionDescriptionPayload),
    Answer(SessionDescriptionPayload),
    Ice(IceCandidatePayload),
    /// Another peer joined the room.
    UserJoined { client_id: PeerId },
    /// A peer left the room or was evicted from it.
    UserLeft { client_id: PeerId },
    Broadcast {
        kind: BroadcastKind,
        from: Option<PeerId>,
        data: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnvelope {
    pub room: RoomId,
    pub client_id: Option<PeerId>,
    pub message: ServerMessage,
}

impl ServerEnvelope {
    pub fn new(room: RoomId, client_id: Option<PeerId>, message: ServerMessage) -> Self {
        Self {
            room,
            client_id,
            message,
        }
    }

    pub fn encode(&self) -> Result<String, EnvelopeError> {
        let mut from = None;
        let (kind, data) = match &self.message {
            ServerMessage::Joined { client_id } => (
                MessageKind::Joined,
                serde_json::to_value(JoinedData {
                    status: "success".to_owned(),
                    client_id: client_id.clone(),
                })?,
            ),
            ServerMessage::Offer(sdp) => (MessageKind::Offer, serde_json::to_value(sdp)?),
            ServerMessage::Answer(sdp) => (MessageKind::Answer, serde_json::to_value(sdp)?),
            ServerMessage::Ice(candidate) => (MessageKind::Ice, serde_json::to_value(candidate)?),
            ServerMessage::UserJoined { client_id } => (
                MessageKind::UserJoined,
                serde_json::to_value(PresenceData {
                    client_id: client_id.clone(),
                })?,
            ),
            ServerMessage::UserLeft { client_id } => (
                MessageKind::UserLeft,
                serde_json::to_value(PresenceData {
                    client_id: client_id.clone(),
                })?,
            ),
            ServerMessage::Broadcast {
                kind,
                from: sender,
                data,
            } => {
                from = sender.clone();
                (kind.kind(), data.clone())
            }
        };
        let wire = WireEnvelope {
            kind,
            data,
            room: self.room.clone(),
            role: None,
            client_id: self.client_id.clone(),
            from,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Client-side decoding of a server envelope.
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope = serde_json::from_str(text)?;
        let message = match wire.kind {
            MessageKind::Joined => {
                let data: JoinedData = payload(wire.data)?;
                ServerMessage::Joined {
                    client_id: data.client_id,
                }
            }
            MessageKind::Offer => ServerMessage::Offer(payload(wire.data)?),
            MessageKind::Answer => ServerMessage::Answer(payload(wire.data)?),
            MessageKind::Ice => ServerMessage::Ice(payload(wire.data)?),
            MessageKind::UserJoined => {
                let data: PresenceData = payload(wire.data)?;
                ServerMessage::UserJoined {
                    client_id: data.client_id,
                }
            }
            MessageKind::UserLeft => {
                let data: PresenceData = payload(wire.data)?;
                ServerMessage::UserLeft {
                    client_id: data.client_id,
                }
            }
            kind => match BroadcastKind::from_kind(kind) {
                Some(kind) => ServerMessage::Broadcast {
                    kind,
                    from: wire.from,
                    data: wire.data,
                },
                None => return Err(EnvelopeError::UnexpectedType(kind)),
            },
        };
        Ok(Self {
            room: wire.room,
            client_id: wire.client_id,
            message,
        })
    }
}

fn payload<T: DeserializeOwned>(data: Value) -> Result<T, EnvelopeError> {
    if data.is_null() {
        return Err(EnvelopeError::MissingField("data"));
    }
    Ok(serde_json::from_value(data)?)
}
