use crate::config::SfuConfig;
use crate::relay::TrackRelay;
use crate::room::{Admission, Departure, PeerHandle, PeerSession, Room, RoomRegistry};
use crate::signaling::{Connection, ConnectionId};
use crate::transport::{SessionEvent, SessionFactory, WebRtcSessionFactory};
use crate::viewer_count::{LogViewerCount, ViewerCountReporter, ViewerCountSink};
use anyhow::{Context, Result};
use serde_json::Value;
use shopcast_core::{
    BroadcastKind, IceCandidatePayload, IceServerConfig, PeerId, Role, RoomId, ServerEnvelope,
    ServerMessage, SessionDescriptionPayload,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const SESSION_EVENT_BUFFER: usize = 64;

struct SignalingInner {
    registry: RoomRegistry,
    sessions: Arc<dyn SessionFactory>,
    relay: TrackRelay,
    config: SfuConfig,
}

/// Shared state behind every connection: the room registry plus the
/// collaborators rooms need. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(
        config: SfuConfig,
        sessions: Arc<dyn SessionFactory>,
        viewer_counts: Arc<dyn ViewerCountSink>,
    ) -> Self {
        let registry = RoomRegistry::new(
            config.room_idle_ttl,
            ViewerCountReporter::spawn(viewer_counts),
        );
        Self {
            inner: Arc::new(SignalingInner {
                relay: TrackRelay::new(registry.clone()),
                registry,
                sessions,
                config,
            }),
        }
    }

    /// Service backed by real WebRTC sessions, logging viewer counts.
    pub fn with_webrtc(config: SfuConfig) -> Self {
        let sessions = Arc::new(WebRtcSessionFactory::new(config.transport.clone()));
        Self::new(config, sessions, Arc::new(LogViewerCount))
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &SfuConfig {
        &self.inner.config
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.config.transport.ice_servers.clone()
    }

    /// Creates a media session for `peer_id` and makes it a member of `room_id`.
    ///
    /// Any entry with the same id is replaced, as is the previous publisher when
    /// `role` is publisher. A viewer receives the publisher's current tracks
    /// before `joined` is sent. The rest of the room then hears `user_left`
    /// for every peer the join displaced and `user_joined` for the newcomer.
    pub async fn join(
        &self,
        connection: &Connection,
        room_id: &RoomId,
        peer_id: &PeerId,
        role: Role,
    ) -> Result<()> {
        let (events_tx, events_rx) = mpsc::channel(SESSION_EVENT_BUFFER);
        let session = self
            .inner
            .sessions
            .create(peer_id, events_tx)
            .await
            .context("Failed to create media session")?;

        let cancel = CancellationToken::new();
        self.spawn_session_pump(
            PeerHandle {
                id: peer_id.clone(),
                role,
                connection: connection.clone(),
                session: session.clone(),
            },
            room_id.clone(),
            events_rx,
            cancel.clone(),
        );

        let mut peer = PeerSession::new(peer_id.clone(), role, connection.clone(), session, cancel);
        loop {
            let room = self.inner.registry.get_or_create(room_id);
            match room.admit(peer).await {
                Admission::Retired(returned) => {
                    debug!(room = %room_id, "Joined a retired room, retrying");
                    self.inner.registry.remove_retired(&room);
                    peer = returned;
                }
                Admission::Admitted { evicted, others } => {
                    let displaced: Vec<PeerId> = evicted
                        .iter()
                        .filter(|previous| &previous.id != peer_id)
                        .map(|previous| previous.id.clone())
                        .collect();
                    for previous in evicted {
                        previous.close().await;
                    }

                    info!(room = %room_id, peer = %peer_id, %role, "Peer joined");
                    connection.send(&ServerEnvelope::new(
                        room_id.clone(),
                        Some(peer_id.clone()),
                        ServerMessage::Joined {
                            client_id: peer_id.clone(),
                        },
                    ));
                    for client_id in displaced {
                        notify(&others, room_id, ServerMessage::UserLeft { client_id });
                    }
                    notify(
                        &others,
                        room_id,
                        ServerMessage::UserJoined {
                            client_id: peer_id.clone(),
                        },
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Answers a client offer on the connection it arrived on.
    pub async fn offer(
        &self,
        connection: &Connection,
        room_id: &RoomId,
        client_id: Option<&PeerId>,
        sdp: String,
    ) -> Result<()> {
        let Some(peer) = self.resolve(room_id, client_id, connection.id()).await else {
            debug!(room = %room_id, "Offer for an unknown peer dropped");
            return Ok(());
        };

        let answer = peer.session.accept_offer(sdp).await?;
        connection.send(&ServerEnvelope::new(
            room_id.clone(),
            Some(peer.id.clone()),
            ServerMessage::Answer(SessionDescriptionPayload { sdp: answer }),
        ));
        debug!(room = %room_id, peer = %peer.id, "Answer sent");
        Ok(())
    }

    pub async fn answer(
        &self,
        connection: &Connection,
        room_id: &RoomId,
        client_id: Option<&PeerId>,
        sdp: String,
    ) -> Result<()> {
        let Some(peer) = self.resolve(room_id, client_id, connection.id()).await else {
            debug!(room = %room_id, "Answer for an unknown peer dropped");
            return Ok(());
        };
        peer.session.accept_answer(sdp).await
    }

    pub async fn ice(
        &self,
        connection: &Connection,
        room_id: &RoomId,
        client_id: Option<&PeerId>,
        candidate: IceCandidatePayload,
    ) -> Result<()> {
        let Some(peer) = self.resolve(room_id, client_id, connection.id()).await else {
            debug!(room = %room_id, "ICE candidate for an unknown peer dropped");
            return Ok(());
        };
        peer.session.add_ice_candidate(candidate).await
    }

    /// Relays a chat message, reaction or seller status notice to the room.
    ///
    /// The sender must be a member joined over `connection`. Chat and
    /// reactions reach every member, the sender included, tagged with the
    /// sender's id. Seller status notices are accepted from the publisher only
    /// and reach everyone else.
    pub async fn broadcast(
        &self,
        connection: &Connection,
        room_id: &RoomId,
        client_id: Option<&PeerId>,
        kind: BroadcastKind,
        data: Value,
    ) -> Result<()> {
        let Some(room) = self.inner.registry.get(room_id) else {
            debug!(room = %room_id, %kind, "Broadcast to an unknown room dropped");
            return Ok(());
        };
        let Some(sender) = room.member_on(client_id, connection.id()).await else {
            debug!(room = %room_id, %kind, "Broadcast from a non-member dropped");
            return Ok(());
        };

        let (recipients, from) = if kind.is_social() {
            (room.connections_except(None).await, Some(sender.id))
        } else if sender.role == Role::Publisher {
            (room.connections_except(Some(&sender.id)).await, None)
        } else {
            debug!(room = %room_id, peer = %sender.id, %kind, "Seller notice from a viewer dropped");
            return Ok(());
        };

        notify(
            &recipients,
            room_id,
            ServerMessage::Broadcast { kind, from, data },
        );
        Ok(())
    }

    /// Removes `peer_id` from `room_id` if it still belongs to `connection`.
    pub async fn leave(&self, room_id: &RoomId, peer_id: &PeerId, connection: ConnectionId) {
        let Some(room) = self.inner.registry.get(room_id) else {
            return;
        };

        let departure = room.remove_owned(peer_id, connection).await;
        if departure.is_empty() {
            debug!(room = %room_id, peer = %peer_id, "Peer already replaced or removed");
            return;
        }
        self.settle(&room, departure).await;
    }

    /// Peer-by-connection resolution scans the room; rooms are small.
    async fn resolve(
        &self,
        room_id: &RoomId,
        client_id: Option<&PeerId>,
        connection: ConnectionId,
    ) -> Option<PeerHandle> {
        let room = self.inner.registry.get(room_id)?;
        room.resolve(client_id, connection).await
    }

    /// Finishes a removal outside the room lock.
    pub(crate) async fn settle(&self, room: &Arc<Room>, departure: Departure) {
        let Departure {
            removed,
            remaining,
            now_empty,
        } = departure;

        for peer in removed {
            info!(room = %room.id, peer = %peer.id, "Peer left");
            let client_id = peer.id.clone();
            peer.close().await;
            notify(&remaining, &room.id, ServerMessage::UserLeft { client_id });
        }
        if now_empty {
            self.inner.registry.schedule_idle_removal(room.clone());
        }
    }

    /// Routes the events of `peer`'s media session until it is cancelled.
    fn spawn_session_pump(
        &self,
        peer: PeerHandle,
        room_id: RoomId,
        mut events: mpsc::Receiver<SessionEvent>,
        cancel: CancellationToken,
    ) {
        let relay = self.inner.relay.clone();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                match event {
                    SessionEvent::LocalCandidate(candidate) => {
                        peer.connection.send(&ServerEnvelope::new(
                            room_id.clone(),
                            Some(peer.id.clone()),
                            ServerMessage::Ice(candidate),
                        ));
                    }
                    SessionEvent::Track(track) if peer.role == Role::Publisher => {
                        relay
                            .relay(&room_id, &peer.id, &peer.session, track, &cancel)
                            .await;
                    }
                    SessionEvent::Track(_) => {
                        debug!(room = %room_id, peer = %peer.id, "Ignoring track sent by a viewer");
                    }
                    SessionEvent::StateChanged(state) => {
                        debug!(room = %room_id, peer = %peer.id, %state, "Session state");
                    }
                }
            }
            debug!(room = %room_id, peer = %peer.id, "Session event pump stopped");
        });
    }
}

fn notify(connections: &[Connection], room_id: &RoomId, message: ServerMessage) {
    let envelope = ServerEnvelope::new(room_id.clone(), None, message);
    for connection in connections {
        connection.send(&envelope);
    }
}
