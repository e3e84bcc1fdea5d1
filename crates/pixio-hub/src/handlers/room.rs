use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use pixio_core::error::Result;
use pixio_core::protocol::messages::{JoinRoom, JoinRoomSuccess, LeaveRoom};
use pixio_core::protocol::{decode_payload, MessageType};

use crate::dispatch::MessageHandler;
use crate::realtime::{Connection, Hub};

/// `join_room`: resolve access, join (creating the room if needed), reply
/// `join_room_success`.
pub struct JoinRoomHandler;

#[async_trait]
impl MessageHandler for JoinRoomHandler {
    fn message_type(&self) -> MessageType {
        MessageType::JoinRoom
    }

    async fn handle(&self, hub: &Hub, conn: &Arc<Connection>, payload: Bytes) -> Result<()> {
        let req: JoinRoom = decode_payload(&payload)?;
        let room = hub.join_room(conn, &req.canvas_id).await?;

        conn.send_message(
            MessageType::JoinRoomSuccess,
            &JoinRoomSuccess {
                canvas_id: room.canvas_id().to_string(),
                user_id: conn.user_id().to_string(),
                connection_id: conn.connection_id().to_string(),
            },
        )
    }
}

/// `leave_room`: idempotent, no reply.
pub struct LeaveRoomHandler;

#[async_trait]
impl MessageHandler for LeaveRoomHandler {
    fn message_type(&self) -> MessageType {
        MessageType::LeaveRoom
    }

    async fn handle(&self, hub: &Hub, conn: &Arc<Connection>, payload: Bytes) -> Result<()> {
        let req: LeaveRoom = decode_payload(&payload)?;
        hub.leave_room(conn, &req.canvas_id).await;
        Ok(())
    }
}
