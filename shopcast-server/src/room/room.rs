use crate::room::PeerSession;
use crate::signaling::{Connection, ConnectionId};
use crate::transport::MediaSession;
use crate::viewer_count::ViewerCountReporter;
use shopcast_core::{PeerId, Role, RoomId, RoomStats};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;

/// A named group of peers: at most one publisher and any number of viewers.
///
/// Membership is guarded by the room's own lock. Nothing in here touches the
/// registry, and media sessions are never closed while the lock is held:
/// removed sessions are handed back to the caller instead. Viewer counts are
/// enqueued under the lock so they are reported in membership order.
pub struct Room {
    pub id: RoomId,
    state: Mutex<RoomState>,
    viewer_counts: ViewerCountReporter,
}

struct RoomState {
    peers: HashMap<PeerId, PeerSession>,
    /// Set once the room has been picked for idle removal; joins must not land here.
    retired: bool,
    /// When the room last became empty; `None` while it has members.
    empty_since: Option<Instant>,
}

impl RoomState {
    fn publisher(&self) -> Option<&PeerSession> {
        self.peers.values().find(|p| p.is_publisher())
    }

    fn viewer_count(&self) -> usize {
        self.peers.values().filter(|p| !p.is_publisher()).count()
    }

    fn connections_except(&self, excluded: &PeerId) -> Vec<Connection> {
        self.peers
            .values()
            .filter(|p| &p.id != excluded)
            .map(|p| p.connection.clone())
            .collect()
    }

    fn remove_where(&mut self, mut pred: impl FnMut(&PeerSession) -> bool) -> Removal {
        let viewers_before = self.viewer_count();
        let ids: Vec<PeerId> = self
            .peers
            .values()
            .filter(|p| pred(p))
            .map(|p| p.id.clone())
            .collect();
        let removed: Vec<PeerSession> = ids
            .iter()
            .filter_map(|id| self.peers.remove(id))
            .collect();
        let now_empty = self.peers.is_empty();
        if now_empty && !removed.is_empty() {
            self.empty_since = Some(Instant::now());
        }

        Removal {
            departure: Departure {
                removed,
                remaining: self.peers.values().map(|p| p.connection.clone()).collect(),
                now_empty,
            },
            viewers_before,
            viewers_after: self.viewer_count(),
        }
    }
}

/// A departure plus the viewer counts around it, still under the lock.
struct Removal {
    departure: Departure,
    viewers_before: usize,
    viewers_after: usize,
}

/// Cheap copy of what is needed to talk to a peer outside the room lock.
#[derive(Clone)]
pub struct PeerHandle {
    pub id: PeerId,
    pub role: Role,
    pub connection: Connection,
    pub session: Arc<dyn MediaSession>,
}

impl From<&PeerSession> for PeerHandle {
    fn from(peer: &PeerSession) -> Self {
        Self {
            id: peer.id.clone(),
            role: peer.role,
            connection: peer.connection.clone(),
            session: peer.session.clone(),
        }
    }
}

pub enum Admission {
    Admitted {
        /// Sessions displaced by the join, to be closed by the caller.
        evicted: Vec<PeerSession>,
        /// Connections of every other member, for presence notices.
        others: Vec<Connection>,
    },
    /// The room was retired; the peer is handed back so the join can be retried.
    Retired(PeerSession),
}

/// Peers taken out of a room.
pub struct Departure {
    pub removed: Vec<PeerSession>,
    /// Connections of the members left behind.
    pub remaining: Vec<Connection>,
    pub now_empty: bool,
}

impl Departure {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

impl Room {
    pub fn new(id: RoomId, viewer_counts: ViewerCountReporter) -> Self {
        Self {
            id,
            state: Mutex::new(RoomState {
                peers: HashMap::new(),
                retired: false,
                empty_since: Some(Instant::now()),
            }),
            viewer_counts,
        }
    }

    fn report_viewers(&self, before: usize, after: usize) {
        if before != after {
            self.viewer_counts.report(&self.id, after);
        }
    }

    /// Inserts `peer`, evicting any entry with the same id and, for a
    /// publisher, the previous publisher. A joining viewer gets every
    /// forwarding track of the current publisher attached before it is
    /// inserted.
    pub async fn admit(&self, peer: PeerSession) -> Admission {
        let mut state = self.state.lock().await;
        if state.retired {
            return Admission::Retired(peer);
        }

        let viewers_before = state.viewer_count();
        let mut evicted = Vec::new();

        if let Some(previous) = state.peers.remove(&peer.id) {
            debug!(room = %self.id, peer = %peer.id, "Replacing existing session");
            evicted.push(previous);
        }

        if peer.is_publisher() {
            let previous = state.publisher().map(|p| p.id.clone());
            if let Some(previous) = previous.and_then(|id| state.peers.remove(&id)) {
                info!(room = %self.id, old = %previous.id, new = %peer.id, "Publisher replaced");
                evicted.push(previous);
            }
        } else if let Some(publisher) = state.publisher() {
            for track in &publisher.forwarding {
                if let Err(e) = peer.session.add_track(track.clone()).await {
                    warn!(room = %self.id, peer = %peer.id, "Failed to attach track: {:?}", e);
                }
            }
        }

        let others = state.connections_except(&peer.id);
        state.peers.insert(peer.id.clone(), peer);
        state.empty_since = None;
        self.report_viewers(viewers_before, state.viewer_count());

        Admission::Admitted { evicted, others }
    }

    /// Removes `peer_id` if its entry still belongs to `connection`.
    pub async fn remove_owned(&self, peer_id: &PeerId, connection: ConnectionId) -> Departure {
        let mut state = self.state.lock().await;
        let removal = state.remove_where(|p| &p.id == peer_id && p.connection.id() == connection);
        self.finish(removal)
    }

    fn finish(&self, removal: Removal) -> Departure {
        self.report_viewers(removal.viewers_before, removal.viewers_after);
        removal.departure
    }

    /// Probes every peer's connection and removes those that fail.
    pub async fn remove_unresponsive(&self, liveness_timeout: Duration) -> Departure {
        let mut state = self.state.lock().await;
        let room = &self.id;
        let removal = state.remove_where(|p| match p.connection.check_liveness(liveness_timeout) {
            Ok(()) => false,
            Err(e) => {
                warn!(room = %room, peer = %p.id, "Liveness check failed: {}", e);
                true
            }
        });
        self.finish(removal)
    }

    /// Finds the addressed peer, or the one joined over `connection` when no id is given.
    pub async fn resolve(
        &self,
        client_id: Option<&PeerId>,
        connection: ConnectionId,
    ) -> Option<PeerHandle> {
        let state = self.state.lock().await;
        let peer = match client_id {
            Some(id) => state.peers.get(id),
            None => state
                .peers
                .values()
                .find(|p| p.connection.id() == connection),
        };
        peer.map(PeerHandle::from)
    }

    /// The member joined over `connection`, optionally required to be `client_id`.
    ///
    /// Unlike [`Room::resolve`], an explicit id never reaches a peer of another
    /// connection, so room-wide messages cannot be sent in someone else's name.
    pub async fn member_on(
        &self,
        client_id: Option<&PeerId>,
        connection: ConnectionId,
    ) -> Option<PeerHandle> {
        let state = self.state.lock().await;
        state
            .peers
            .values()
            .find(|p| p.connection.id() == connection && client_id.is_none_or(|id| &p.id == id))
            .map(PeerHandle::from)
    }

    /// Connections of every member except `excluded`.
    pub async fn connections_except(&self, excluded: Option<&PeerId>) -> Vec<Connection> {
        let state = self.state.lock().await;
        state
            .peers
            .values()
            .filter(|p| excluded != Some(&p.id))
            .map(|p| p.connection.clone())
            .collect()
    }

    /// Records `track` on the publisher `publisher_id` and attaches it to
    /// every viewer. Returns the viewers that accepted the track, or `None` if
    /// the publisher entry no longer belongs to `session`.
    pub async fn attach_forwarding_track(
        &self,
        publisher_id: &PeerId,
        session: &Arc<dyn MediaSession>,
        track: &Arc<TrackLocalStaticRTP>,
    ) -> Option<Vec<PeerHandle>> {
        let mut state = self.state.lock().await;

        let publisher = state
            .peers
            .get_mut(publisher_id)
            .filter(|p| p.is_publisher() && p.owns(session))?;
        publisher.forwarding.push(track.clone());

        let mut attached = Vec::new();
        for viewer in state.peers.values().filter(|p| !p.is_publisher()) {
            match viewer.session.add_track(track.clone()).await {
                Ok(()) => attached.push(PeerHandle::from(viewer)),
                Err(e) => {
                    warn!(room = %self.id, peer = %viewer.id, "Failed to attach track: {:?}", e)
                }
            }
        }
        Some(attached)
    }

    /// Marks the room retired if it has been empty for at least `ttl`.
    pub async fn retire_if_idle(&self, ttl: Duration) -> bool {
        let mut state = self.state.lock().await;
        let idle = state.empty_since.is_some_and(|since| since.elapsed() >= ttl);
        if state.peers.is_empty() && idle {
            state.retired = true;
        }
        state.retired
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.peers.is_empty()
    }

    pub async fn stats(&self) -> RoomStats {
        let state = self.state.lock().await;
        let viewers = state.viewer_count();
        RoomStats {
            room_id: self.id.clone(),
            clients: state.peers.len(),
            publishers: state.peers.len() - viewers,
            viewers,
        }
    }

    pub async fn members(&self) -> Vec<(PeerId, Role)> {
        let state = self.state.lock().await;
        state.peers.values().map(|p| (p.id.clone(), p.role)).collect()
    }
}
