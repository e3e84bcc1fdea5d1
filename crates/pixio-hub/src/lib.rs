//! pixio hub library entry.
//!
//! Real-time collaboration hub for the pixel canvas editor: WebSocket
//! transport, auth handshake, per-canvas rooms, and the message handlers.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod access;
pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod policy;
pub mod realtime;
pub mod router;
pub mod transport;
