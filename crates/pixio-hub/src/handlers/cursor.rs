use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use pixio_core::error::{PixioError, Result};
use pixio_core::protocol::messages::{MousePosition, MousePositionUpdate};
use pixio_core::protocol::{self, decode_payload, MessageType};

use crate::dispatch::MessageHandler;
use crate::realtime::{Connection, Hub};

/// `mouse_position_update`: relay the sender's cursor to the rest of the room.
pub struct CursorHandler;

#[async_trait]
impl MessageHandler for CursorHandler {
    fn message_type(&self) -> MessageType {
        MessageType::MousePositionUpdate
    }

    async fn handle(&self, hub: &Hub, conn: &Arc<Connection>, payload: Bytes) -> Result<()> {
        let req: MousePosition = decode_payload(&payload)?;

        // Only rooms this connection joined; the global registry is not consulted.
        let room = conn
            .joined_room(&req.room_id)
            .await
            .ok_or(PixioError::RoomNotFound)?;

        let frame = protocol::encode(
            MessageType::MousePositionUpdate,
            &MousePositionUpdate {
                user_id: conn.user_id().to_string(),
                x: req.x,
                y: req.y,
                connection_id: conn.connection_id().to_string(),
            },
        )?;

        hub.broadcast(&room, frame, conn).await;
        Ok(())
    }
}
