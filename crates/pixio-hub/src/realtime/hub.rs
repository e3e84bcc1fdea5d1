use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use pixio_core::error::{PixioError, Result};
use pixio_core::protocol::{self, messages::Auth, MessageType};

use crate::access::{
    resolve_role, AccessRole, CanvasRecord, CanvasStore, PixelCodec, StoreError, TokenValidator,
};
use crate::config::HubSection;
use crate::dispatch::Dispatcher;
use crate::handlers::{CursorHandler, JoinRoomHandler, LeaveRoomHandler};
use crate::realtime::connection::Connection;
use crate::realtime::room::{Room, RoomRegistry};

/// Tunables the hub needs at runtime.
#[derive(Debug, Clone)]
pub struct HubSettings {
    /// How long a room may stay empty before eviction.
    pub room_idle: Duration,
    /// Outbound queue capacity per connection.
    pub outbound_queue: usize,
}

impl HubSettings {
    pub fn from_config(hub: &HubSection) -> Self {
        Self {
            room_idle: Duration::from_millis(hub.room_idle_ms),
            outbound_queue: hub.outbound_queue,
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            room_idle: Duration::from_secs(180),
            outbound_queue: 256,
        }
    }
}

/// Registry of live connections and rooms, plus the message dispatcher.
pub struct Hub {
    // user_id -> connection_id -> connection
    connections: RwLock<HashMap<String, HashMap<String, Arc<Connection>>>>,
    rooms: Arc<RoomRegistry>,
    dispatcher: Dispatcher,
    store: Arc<dyn CanvasStore>,
    tokens: Arc<dyn TokenValidator>,
    codec: Arc<dyn PixelCodec>,
    settings: HubSettings,
}

impl Hub {
    pub fn new(
        store: Arc<dyn CanvasStore>,
        tokens: Arc<dyn TokenValidator>,
        codec: Arc<dyn PixelCodec>,
        settings: HubSettings,
    ) -> Self {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(JoinRoomHandler));
        dispatcher.register(Arc::new(LeaveRoomHandler));
        dispatcher.register(Arc::new(CursorHandler));

        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: Arc::new(RoomRegistry::new()),
            dispatcher,
            store,
            tokens,
            codec,
            settings,
        }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // --------------------
    // Handshake
    // --------------------

    /// Validate the first frame of a connection.
    ///
    /// The frame must be an `auth` envelope whose token validates; if the
    /// caller supplied `expected_user` (e.g. from the URL) it must match the
    /// token's user. Returns the authenticated user id.
    pub fn authenticate(&self, frame: &[u8], expected_user: Option<&str>) -> Result<String> {
        let auth: Auth = protocol::decode_typed(MessageType::Auth, frame)?;

        let user_id = self
            .tokens
            .validate_access_token(&auth.token)
            .ok_or(PixioError::AuthFailed)?;

        if let Some(expected) = expected_user {
            if expected != user_id {
                tracing::warn!(expected = %expected, user_id = %user_id, "token identity mismatch");
                return Err(PixioError::AuthFailed);
            }
        }

        Ok(user_id)
    }

    // --------------------
    // Connection registry
    // --------------------

    /// Create and register a connection for an authenticated user.
    pub async fn open_connection(&self, user_id: &str) -> (Arc<Connection>, mpsc::Receiver<Bytes>) {
        let (conn, rx) = Connection::new(user_id, self.settings.outbound_queue);
        self.add_connection(Arc::clone(&conn)).await;
        (conn, rx)
    }

    pub async fn add_connection(&self, conn: Arc<Connection>) {
        tracing::info!(
            user_id = %conn.user_id(),
            connection_id = %conn.connection_id(),
            "connection registered"
        );
        self.connections
            .write()
            .await
            .entry(conn.user_id().to_string())
            .or_default()
            .insert(conn.connection_id().to_string(), conn);
    }

    /// Tear a connection down: leave every joined room, close its queue, and
    /// drop it from the registry. Safe to call more than once.
    pub async fn remove_connection(&self, conn: &Arc<Connection>) {
        for room in conn.take_rooms().await {
            room.remove_member(conn.connection_id()).await;
        }

        conn.close();

        let mut conns = self.connections.write().await;
        if let Some(by_id) = conns.get_mut(conn.user_id()) {
            if by_id.remove(conn.connection_id()).is_some() {
                tracing::info!(
                    user_id = %conn.user_id(),
                    connection_id = %conn.connection_id(),
                    "connection closed"
                );
            }
            if by_id.is_empty() {
                conns.remove(conn.user_id());
            }
        }
    }

    pub async fn get_connection(&self, user_id: &str, connection_id: &str) -> Option<Arc<Connection>> {
        self.connections
            .read()
            .await
            .get(user_id)
            .and_then(|by_id| by_id.get(connection_id))
            .cloned()
    }

    pub async fn connections_of(&self, user_id: &str) -> Vec<Arc<Connection>> {
        self.connections
            .read()
            .await
            .get(user_id)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(HashMap::len).sum()
    }

    /// Close every connection's outbound queue; writers then close their sockets.
    pub async fn shutdown(&self) {
        let all: Vec<Arc<Connection>> = self
            .connections
            .read()
            .await
            .values()
            .flat_map(|by_id| by_id.values().cloned())
            .collect();
        tracing::info!(connections = all.len(), "hub shutting down");
        for conn in &all {
            self.remove_connection(conn).await;
        }
    }

    // --------------------
    // Dispatch
    // --------------------

    /// Route one inbound frame of an authenticated connection.
    ///
    /// Never fails: protocol, permission, and upstream errors are answered
    /// with an `error` envelope and the connection stays open.
    pub async fn dispatch(&self, conn: &Arc<Connection>, frame: &[u8]) {
        let env = match protocol::decode(frame) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(connection_id = %conn.connection_id(), error = %e, "undecodable frame");
                conn.send_error(&e, None);
                return;
            }
        };

        let request_type = env.message_type();
        if let Err(e) = self.dispatcher.dispatch(self, conn, env).await {
            if e.is_upstream() {
                tracing::error!(
                    user_id = %conn.user_id(),
                    connection_id = %conn.connection_id(),
                    error = %e,
                    "handler failed upstream"
                );
            } else {
                tracing::debug!(connection_id = %conn.connection_id(), error = %e, "request rejected");
            }
            conn.send_error(&e, request_type);
        }
    }

    // --------------------
    // Rooms
    // --------------------

    pub async fn room(&self, canvas_id: &str) -> Option<Arc<Room>> {
        self.rooms.get(canvas_id).await
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.len().await
    }

    /// Effective role of `user_id` on a canvas, fetching the canvas on the way.
    async fn resolve_access(
        &self,
        canvas_id: &str,
        user_id: &str,
    ) -> Result<(CanvasRecord, AccessRole)> {
        let canvas = match self.store.get_canvas(canvas_id).await {
            Ok(c) => c,
            Err(StoreError::NotFound) => return Err(PixioError::CanvasNotFound),
            Err(StoreError::Backend(e)) => return Err(PixioError::FetchingCanvasFailed(e)),
        };

        let explicit = if canvas.owner_id == user_id {
            None
        } else {
            match self.store.get_user_access(canvas_id, user_id).await {
                Ok(role) => Some(role),
                Err(StoreError::NotFound) => None,
                Err(StoreError::Backend(e)) => return Err(PixioError::FetchingUserAccessFailed(e)),
            }
        };

        let role = resolve_role(&canvas, user_id, explicit).ok_or(PixioError::MissingPermissions)?;
        Ok((canvas, role))
    }

    /// Join `conn` to the room of `canvas_id`, creating and loading the room
    /// on first use.
    pub async fn join_room(&self, conn: &Arc<Connection>, canvas_id: &str) -> Result<Arc<Room>> {
        let (canvas, role) = self.resolve_access(canvas_id, conn.user_id()).await?;

        let room = loop {
            let room = self.rooms.get_or_create(&canvas, self.settings.room_idle).await;
            if room.add_member(Arc::clone(conn), role).await {
                break room;
            }
            // Evicted between lookup and insert; the registry no longer holds it.
            tracing::debug!(canvas_id = %canvas.id, "joined an evicted room, retrying");
        };

        if room.begin_load().await {
            self.spawn_load(Arc::clone(&room), canvas.pixel_data.clone());
        }

        conn.track_room(Arc::clone(&room)).await;
        tracing::info!(
            user_id = %conn.user_id(),
            connection_id = %conn.connection_id(),
            canvas_id = %canvas.id,
            role = role.as_str(),
            "joined room"
        );
        Ok(room)
    }

    fn spawn_load(&self, room: Arc<Room>, raw: Bytes) {
        let codec = Arc::clone(&self.codec);
        tokio::spawn(async move {
            let pixels = match tokio::task::spawn_blocking(move || codec.decompress(&raw)).await {
                Ok(Ok(pixels)) => Some(pixels),
                Ok(Err(e)) => {
                    tracing::error!(canvas_id = %room.canvas_id(), error = %e, "failed to load canvas pixel data");
                    None
                }
                Err(e) => {
                    tracing::error!(canvas_id = %room.canvas_id(), error = %e, "canvas load task failed");
                    None
                }
            };
            room.finish_load(pixels).await;
        });
    }

    /// Remove `conn` from the room of `canvas_id`. Leaving a room that was
    /// never joined is a no-op.
    pub async fn leave_room(&self, conn: &Arc<Connection>, canvas_id: &str) {
        if let Some(room) = conn.untrack_room(canvas_id).await {
            room.remove_member(conn.connection_id()).await;
            tracing::info!(
                user_id = %conn.user_id(),
                connection_id = %conn.connection_id(),
                canvas_id = %canvas_id,
                "left room"
            );
        }
    }

    /// Fan `frame` out to every member of `room` except `sender`.
    pub async fn broadcast(&self, room: &Room, frame: Bytes, sender: &Connection) -> usize {
        room.broadcast(frame, Some(sender.connection_id())).await
    }
}
