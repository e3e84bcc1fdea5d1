use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use prost::Message;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use pixio_core::error::{PixioError, Result};
use pixio_core::protocol::{self, messages::WsError, MessageType};

use crate::realtime::room::Room;

/// One authenticated socket.
///
/// `user_id` is the stable identity and may be shared by several sockets;
/// `connection_id` is unique per socket.
pub struct Connection {
    user_id: String,
    connection_id: String,
    // None once closed. Only this slot holds the sender, so taking it closes the queue.
    outbound: Mutex<Option<mpsc::Sender<Bytes>>>,
    rooms: RwLock<HashMap<String, Arc<Room>>>,
}

impl Connection {
    /// Create a connection with a bounded outbound queue of `queue` frames.
    /// The receiver belongs to the socket writer.
    pub fn new(user_id: impl Into<String>, queue: usize) -> (Arc<Self>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let conn = Arc::new(Self {
            user_id: user_id.into(),
            connection_id: Uuid::new_v4().to_string(),
            outbound: Mutex::new(Some(tx)),
            rooms: RwLock::new(HashMap::new()),
        });
        (conn, rx)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Queue one encoded frame without waiting.
    ///
    /// A full queue drops this frame (drop-newest) so one slow reader never
    /// stalls a broadcast. Returns false when the frame was not queued.
    pub fn send(&self, frame: Bytes) -> bool {
        let Ok(slot) = self.outbound.lock() else {
            return false;
        };
        let Some(tx) = slot.as_ref() else {
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(
                    user_id = %self.user_id,
                    connection_id = %self.connection_id,
                    "outbound queue full, frame dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Encode `payload` as a `msg_type` envelope and queue it.
    pub fn send_message<M: Message>(&self, msg_type: MessageType, payload: &M) -> Result<()> {
        let frame = protocol::encode(msg_type, payload)?;
        self.send(frame);
        Ok(())
    }

    /// Queue an `error` envelope for `err`. `request_type` names the message
    /// that caused it, if any.
    pub fn send_error(&self, err: &PixioError, request_type: Option<MessageType>) {
        let payload = WsError {
            message: err.error_code().as_str().to_string(),
            request_type: request_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
        };
        if let Err(e) = self.send_message(MessageType::Error, &payload) {
            tracing::error!(connection_id = %self.connection_id, error = %e, "encode error envelope failed");
        }
    }

    /// Close the outbound queue. Returns true only for the call that closed it.
    pub fn close(&self) -> bool {
        match self.outbound.lock() {
            Ok(mut slot) => slot.take().is_some(),
            Err(_) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.lock().map(|s| s.is_none()).unwrap_or(true)
    }

    /// Room this connection joined under `canvas_id`, if any.
    pub async fn joined_room(&self, canvas_id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(canvas_id).cloned()
    }

    pub async fn joined_rooms(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) async fn track_room(&self, room: Arc<Room>) {
        self.rooms
            .write()
            .await
            .insert(room.canvas_id().to_string(), room);
    }

    pub(crate) async fn untrack_room(&self, canvas_id: &str) -> Option<Arc<Room>> {
        self.rooms.write().await.remove(canvas_id)
    }

    pub(crate) async fn take_rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.write().await.drain().map(|(_, r)| r).collect()
    }
}
