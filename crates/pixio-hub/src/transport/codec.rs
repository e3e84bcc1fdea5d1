//! Frame classification for the transport layer.
//!
//! - Binary frames carry envelopes and are handed on as `Bytes`
//! - Text frames are not part of the protocol
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use bytes::Bytes;

#[derive(Debug)]
pub enum Inbound {
    Frame(Bytes),
    Text(usize),
    Ping,
    Pong,
    Close,
}

pub fn classify(msg: Message) -> Inbound {
    match msg {
        Message::Binary(b) => Inbound::Frame(Bytes::from(b)),
        Message::Text(s) => Inbound::Text(s.len()),
        Message::Ping(_) => Inbound::Ping,
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
    }
}
