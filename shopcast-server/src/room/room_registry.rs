use crate::room::Room;
use crate::viewer_count::ViewerCountReporter;
use dashmap::DashMap;
use shopcast_core::{RoomId, RoomStats};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Process-wide map of live rooms.
///
/// The map is only ever locked before a room lock, never while one is held.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Arc<Room>>>,
    idle_ttl: Duration,
    viewer_counts: ViewerCountReporter,
}

impl RoomRegistry {
    pub fn new(idle_ttl: Duration, viewer_counts: ViewerCountReporter) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            idle_ttl,
            viewer_counts,
        }
    }

    pub fn get_or_create(&self, room_id: &RoomId) -> Arc<Room> {
        if let Some(room) = self.rooms.get(room_id) {
            return room.value().clone();
        }

        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!(room = %room_id, "Creating new room");
                Arc::new(Room::new(room_id.clone(), self.viewer_counts.clone()))
            })
            .value()
            .clone()
    }

    pub fn get(&self, room_id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|room| room.value().clone())
    }

    /// Snapshot of the current rooms; the map is not locked while they are visited.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub async fn stats(&self, room_id: &RoomId) -> Option<RoomStats> {
        let room = self.get(room_id)?;
        Some(room.stats().await)
    }

    /// Drops `room` from the map, provided the id still maps to this very room.
    pub fn remove_retired(&self, room: &Arc<Room>) -> bool {
        self.rooms
            .remove_if(&room.id, |_, current| Arc::ptr_eq(current, room))
            .is_some()
    }

    /// Removes `room` once it has stayed empty for the whole idle TTL.
    ///
    /// Called every time the room becomes empty. A timer that fires while the
    /// room is occupied, or emptied again more recently, leaves it to the later timer.
    pub fn schedule_idle_removal(&self, room: Arc<Room>) {
        let registry = self.clone();
        let ttl = self.idle_ttl;
        debug!(room = %room.id, ?ttl, "Room empty, scheduling removal");

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if room.retire_if_idle(ttl).await && registry.remove_retired(&room) {
                info!(room = %room.id, "Removed idle room");
            }
        });
    }
}
