//! Built-in message handlers registered by the hub.

mod cursor;
mod room;

pub use cursor::CursorHandler;
pub use room::{JoinRoomHandler, LeaveRoomHandler};
