//! Realtime hub: connection registry, rooms, broadcast.
//!
//! Two reader/writer-locked registries (connections, rooms) plus one lock per
//! room. Handlers run inline on the connection's reader task; the pixel load
//! is the only work pushed to a detached task.

mod connection;
mod hub;
mod room;

pub use connection::Connection;
pub use hub::{Hub, HubSettings};
pub use room::{LoadStatus, Member, Room, RoomRegistry};
