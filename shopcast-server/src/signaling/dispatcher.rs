use crate::signaling::{Connection, SignalingService};
use anyhow::Result;
use shopcast_core::{ClientMessage, Envelope, PeerId, Role, RoomId};
use tracing::{error, warn};

/// Processes the envelopes of one connection, strictly in arrival order.
pub struct Dispatcher {
    service: SignalingService,
    connection: Connection,
    /// Every (room, peer) joined over this connection.
    memberships: Vec<(RoomId, PeerId)>,
}

impl Dispatcher {
    pub fn new(service: SignalingService, connection: Connection) -> Self {
        Self {
            service,
            connection,
            memberships: Vec::new(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn memberships(&self) -> &[(RoomId, PeerId)] {
        &self.memberships
    }

    /// Decodes and handles one text frame. Malformed frames are logged and dropped.
    pub async fn handle_text(&mut self, text: &str) {
        match Envelope::decode(text) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(e) => warn!(connection = %self.connection.id(), "Invalid signaling envelope: {}", e),
        }
    }

    pub async fn dispatch(&mut self, envelope: Envelope) {
        let kind = envelope.message.kind();
        let room_id = envelope.room.clone();

        if let Err(e) = self.route(envelope).await {
            error!(room = %room_id, %kind, "Signaling failed: {:?}", e);
        }
    }

    async fn route(&mut self, envelope: Envelope) -> Result<()> {
        let Envelope {
            room,
            client_id,
            message,
        } = envelope;

        match message {
            ClientMessage::Join { client_id, role } => self.join(room, client_id, role).await,
            ClientMessage::Offer(offer) => {
                self.service
                    .offer(&self.connection, &room, client_id.as_ref(), offer.sdp)
                    .await
            }
            ClientMessage::Answer(answer) => {
                self.service
                    .answer(&self.connection, &room, client_id.as_ref(), answer.sdp)
                    .await
            }
            ClientMessage::Ice(candidate) => {
                self.service
                    .ice(&self.connection, &room, client_id.as_ref(), candidate)
                    .await
            }
            ClientMessage::Broadcast { kind, data } => {
                self.service
                    .broadcast(&self.connection, &room, client_id.as_ref(), kind, data)
                    .await
            }
        }
    }

    async fn join(&mut self, room: RoomId, peer_id: PeerId, role: Role) -> Result<()> {
        self.service
            .join(&self.connection, &room, &peer_id, role)
            .await?;

        let membership = (room, peer_id);
        if !self.memberships.contains(&membership) {
            self.memberships.push(membership);
        }
        Ok(())
    }

    /// Removes every peer joined over this connection that still belongs to it.
    pub async fn disconnect(self) {
        let connection_id = self.connection.id();
        for (room_id, peer_id) in &self.memberships {
            self.service.leave(room_id, peer_id, connection_id).await;
        }
    }
}
