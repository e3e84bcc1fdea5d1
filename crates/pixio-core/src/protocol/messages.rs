//! Message catalog: type tags and payload schemas.
//!
//! Every payload is a Protocol Buffers message. Field numbers are part of the
//! wire contract and must never be reused.

use std::fmt;

/// Closed set of envelope type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Auth,
    JoinRoom,
    JoinRoomSuccess,
    LeaveRoom,
    MousePositionUpdate,
    Error,
}

impl MessageType {
    pub const ALL: [MessageType; 6] = [
        MessageType::Auth,
        MessageType::JoinRoom,
        MessageType::JoinRoomSuccess,
        MessageType::LeaveRoom,
        MessageType::MousePositionUpdate,
        MessageType::Error,
    ];

    /// Tag written into `Envelope.type`.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Auth => "auth",
            MessageType::JoinRoom => "join_room",
            MessageType::JoinRoomSuccess => "join_room_success",
            MessageType::LeaveRoom => "leave_room",
            MessageType::MousePositionUpdate => "mouse_position_update",
            MessageType::Error => "error",
        }
    }

    /// Resolve a wire tag. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First frame of every connection.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Auth {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct JoinRoom {
    #[prost(string, tag = "1")]
    pub canvas_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct JoinRoomSuccess {
    #[prost(string, tag = "1")]
    pub canvas_id: String,
    #[prost(string, tag = "2")]
    pub user_id: String,
    #[prost(string, tag = "3")]
    pub connection_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LeaveRoom {
    #[prost(string, tag = "1")]
    pub canvas_id: String,
}

/// Inbound cursor position, addressed to one joined room.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MousePosition {
    #[prost(string, tag = "1")]
    pub room_id: String,
    #[prost(int32, tag = "2")]
    pub x: i32,
    #[prost(int32, tag = "3")]
    pub y: i32,
}

/// Outbound cursor position, fanned out to the other room members.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MousePositionUpdate {
    #[prost(string, tag = "1")]
    pub user_id: String,
    #[prost(int32, tag = "2")]
    pub x: i32,
    #[prost(int32, tag = "3")]
    pub y: i32,
    #[prost(string, tag = "4")]
    pub connection_id: String,
}

/// `error` payload. `request_type` names the message that failed whenever
/// its tag is in the catalog; it is empty for handshake errors, undecodable
/// envelopes and tags outside the catalog.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WsError {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(string, tag = "2")]
    pub request_type: String,
}
