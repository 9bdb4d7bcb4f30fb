mod peer;
mod room;
mod signaling;

pub use peer::{PeerId, Role};
pub use room::{RoomId, RoomStats};
pub use signaling::{
    BroadcastKind, ClientMessage, Envelope, IceCandidatePayload, IceServerConfig, MessageKind, ServerEnvelope,
    ServerMessage, SessionDescriptionPayload, WireEnvelope,
};
