//! Transport layer (WebSocket).
//!
//! Upgrade handlers, the auth handshake, and the per-session reader/writer
//! pair. Frames are classified once here before they reach the hub.

pub mod codec;
pub mod handshake;
pub mod ws;

pub use ws::SessionTimings;
