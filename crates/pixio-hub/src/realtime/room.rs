//! Rooms: one broadcast group per canvas with live members.
//!
//! Lock order is registry -> room. Nothing takes the registry lock while
//! holding a room lock, and no room lock is held across the pixel load.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::access::{AccessRole, CanvasRecord, Pixel};
use crate::realtime::connection::Connection;

/// Pixel buffer state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    NotLoaded,
    Loading,
    Loaded,
}

#[derive(Clone)]
pub struct Member {
    pub conn: Arc<Connection>,
    pub role: AccessRole,
}

struct RoomState {
    // connection_id -> member
    members: HashMap<String, Member>,
    pixels: Vec<Pixel>,
    load_status: LoadStatus,
    eviction: Option<JoinHandle<()>>,
    // Set under the registry lock when the room is dropped from the registry.
    evicted: bool,
}

pub struct Room {
    canvas_id: String,
    width: u16,
    height: u16,
    idle: Duration,
    state: RwLock<RoomState>,
    registry: Weak<RoomRegistry>,
}

impl Room {
    fn new(canvas: &CanvasRecord, idle: Duration, registry: Weak<RoomRegistry>) -> Self {
        Self {
            canvas_id: canvas.id.clone(),
            width: canvas.width,
            height: canvas.height,
            idle,
            state: RwLock::new(RoomState {
                members: HashMap::new(),
                pixels: Vec::new(),
                load_status: LoadStatus::NotLoaded,
                eviction: None,
                evicted: false,
            }),
            registry,
        }
    }

    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub async fn load_status(&self) -> LoadStatus {
        self.state.read().await.load_status
    }

    pub async fn member_count(&self) -> usize {
        self.state.read().await.members.len()
    }

    pub async fn has_member(&self, connection_id: &str) -> bool {
        self.state.read().await.members.contains_key(connection_id)
    }

    pub async fn role_of(&self, connection_id: &str) -> Option<AccessRole> {
        self.state
            .read()
            .await
            .members
            .get(connection_id)
            .map(|m| m.role)
    }

    /// Snapshot of the decoded pixel buffer (empty until loaded).
    pub async fn pixels(&self) -> Vec<Pixel> {
        self.state.read().await.pixels.clone()
    }

    pub async fn is_evicted(&self) -> bool {
        self.state.read().await.evicted
    }

    /// Deliver `frame` to every member except `except` (a connection id).
    /// Returns how many members accepted the frame.
    pub async fn broadcast(&self, frame: Bytes, except: Option<&str>) -> usize {
        let st = self.state.read().await;
        let mut delivered = 0;
        for (id, member) in &st.members {
            if Some(id.as_str()) == except {
                continue;
            }
            if member.conn.send(frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Register a member and cancel any pending eviction.
    /// Returns false if the room was already evicted; the caller must look it
    /// up again.
    pub(crate) async fn add_member(&self, conn: Arc<Connection>, role: AccessRole) -> bool {
        let mut st = self.state.write().await;
        if st.evicted {
            return false;
        }
        if let Some(timer) = st.eviction.take() {
            timer.abort();
            tracing::debug!(canvas_id = %self.canvas_id, "room eviction cancelled");
        }
        st.members
            .insert(conn.connection_id().to_string(), Member { conn, role });
        true
    }

    /// Drop a member. Arms the idle eviction timer when the room empties.
    pub(crate) async fn remove_member(self: &Arc<Self>, connection_id: &str) -> bool {
        let mut st = self.state.write().await;
        if st.members.remove(connection_id).is_none() {
            return false;
        }
        if st.members.is_empty() && !st.evicted {
            self.arm_eviction(&mut st);
        }
        true
    }

    fn arm_eviction(self: &Arc<Self>, st: &mut RoomState) {
        if let Some(old) = st.eviction.take() {
            old.abort();
        }

        let room = Arc::downgrade(self);
        let registry = self.registry.clone();
        let idle = self.idle;
        st.eviction = Some(tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            let (Some(room), Some(registry)) = (room.upgrade(), registry.upgrade()) else {
                return;
            };
            registry.evict_if_idle(&room).await;
        }));
        tracing::debug!(canvas_id = %self.canvas_id, idle_ms = idle.as_millis() as u64, "room eviction armed");
    }

    /// `NotLoaded -> Loading`. True if the caller now owns the load.
    pub(crate) async fn begin_load(&self) -> bool {
        let mut st = self.state.write().await;
        if st.load_status != LoadStatus::NotLoaded {
            return false;
        }
        st.load_status = LoadStatus::Loading;
        true
    }

    /// Commit the result of a load started with [`Room::begin_load`].
    /// A failed load (`None`) goes back to `NotLoaded` so the next join
    /// retries it; the room stays usable with an empty buffer meanwhile.
    pub(crate) async fn finish_load(&self, pixels: Option<Vec<Pixel>>) {
        let mut st = self.state.write().await;
        match pixels {
            Some(pixels) => {
                tracing::debug!(canvas_id = %self.canvas_id, pixels = pixels.len(), "canvas loaded");
                st.pixels = pixels;
                st.load_status = LoadStatus::Loaded;
            }
            None => st.load_status = LoadStatus::NotLoaded,
        }
    }
}

/// `canvas_id -> Room` for every room created since start and not yet evicted.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, canvas_id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(canvas_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    pub(crate) async fn get_or_create(
        self: &Arc<Self>,
        canvas: &CanvasRecord,
        idle: Duration,
    ) -> Arc<Room> {
        if let Some(room) = self.get(&canvas.id).await {
            return room;
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(canvas.id.clone())
            .or_insert_with(|| {
                tracing::info!(canvas_id = %canvas.id, "room created");
                Arc::new(Room::new(canvas, idle, Arc::downgrade(self)))
            });
        Arc::clone(room)
    }

    /// Remove `room` if it is still registered and still has no members.
    pub(crate) async fn evict_if_idle(&self, room: &Arc<Room>) -> bool {
        let mut rooms = self.rooms.write().await;
        match rooms.get(room.canvas_id()) {
            Some(current) if Arc::ptr_eq(current, room) => {}
            _ => return false,
        }

        let mut st = room.state.write().await;
        if !st.members.is_empty() {
            return false;
        }
        st.evicted = true;
        // Detach rather than abort: this may be the eviction task itself.
        st.eviction = None;
        drop(st);

        rooms.remove(room.canvas_id());
        tracing::info!(canvas_id = %room.canvas_id(), "idle room evicted");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::LinkAccess;

    const IDLE: Duration = Duration::from_secs(60);

    fn canvas() -> CanvasRecord {
        CanvasRecord {
            id: "c1".into(),
            owner_id: "u1".into(),
            width: 2,
            height: 2,
            link_access: LinkAccess::Restricted,
            link_role: AccessRole::Viewer,
            pixel_data: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn evicted_room_refuses_members_and_is_replaced() {
        let reg = Arc::new(RoomRegistry::new());
        let room = reg.get_or_create(&canvas(), IDLE).await;

        assert!(reg.evict_if_idle(&room).await);
        assert!(room.is_evicted().await);
        assert!(reg.is_empty().await);

        let (conn, _rx) = Connection::new("u1", 4);
        assert!(!room.add_member(Arc::clone(&conn), AccessRole::Owner).await);
        assert_eq!(room.member_count().await, 0);

        let fresh = reg.get_or_create(&canvas(), IDLE).await;
        assert!(!Arc::ptr_eq(&room, &fresh));
        assert!(fresh.add_member(conn, AccessRole::Owner).await);
        assert_eq!(fresh.member_count().await, 1);
    }

    #[tokio::test]
    async fn occupied_room_survives_eviction_check() {
        let reg = Arc::new(RoomRegistry::new());
        let room = reg.get_or_create(&canvas(), IDLE).await;
        let (conn, _rx) = Connection::new("u1", 4);
        assert!(room.add_member(conn, AccessRole::Owner).await);

        assert!(!reg.evict_if_idle(&room).await);
        assert!(!room.is_evicted().await);
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn stale_handle_does_not_evict_successor() {
        let reg = Arc::new(RoomRegistry::new());
        let old = reg.get_or_create(&canvas(), IDLE).await;
        assert!(reg.evict_if_idle(&old).await);
        let fresh = reg.get_or_create(&canvas(), IDLE).await;

        assert!(!reg.evict_if_idle(&old).await);
        let current = reg.get("c1").await.unwrap();
        assert!(Arc::ptr_eq(&current, &fresh));
    }

    #[tokio::test]
    async fn failed_load_reverts_and_can_be_retried() {
        let reg = Arc::new(RoomRegistry::new());
        let room = reg.get_or_create(&canvas(), IDLE).await;
        assert_eq!(room.load_status().await, LoadStatus::NotLoaded);

        assert!(room.begin_load().await);
        assert!(!room.begin_load().await);
        assert_eq!(room.load_status().await, LoadStatus::Loading);

        room.finish_load(None).await;
        assert_eq!(room.load_status().await, LoadStatus::NotLoaded);
        assert!(room.pixels().await.is_empty());

        assert!(room.begin_load().await);
        room.finish_load(Some(vec![Pixel::default(); 4])).await;
        assert_eq!(room.load_status().await, LoadStatus::Loaded);
        assert_eq!(room.pixels().await.len(), 4);
        assert!(!room.begin_load().await);
    }
}
