//! Envelope codec (panic-free).
//!
//! Framing rules:
//! - `encode` serializes the payload first, then wraps it with the type tag.
//! - `decode` only parses the outer envelope; the payload stays opaque bytes
//!   until a handler asks for its schema.
//! - `decode_typed` refuses to touch the payload when the tag differs from
//!   the one the caller expects.

use bytes::{Bytes, BytesMut};
use prost::Message;

use crate::error::{PixioError, Result};
use crate::protocol::messages::MessageType;

/// Outer wire wrapper: one per binary frame.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
}

impl Envelope {
    /// Known message type, if the tag is part of the catalog.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::parse(&self.r#type)
    }
}

fn encode_message<M: Message>(msg: &M) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(msg.encoded_len());
    msg.encode(&mut buf)
        .map_err(|e| PixioError::EncodingFailed(e.to_string()))?;
    Ok(buf.freeze())
}

/// Serialize `payload` and wrap it in an envelope tagged `msg_type`.
pub fn encode<M: Message>(msg_type: MessageType, payload: &M) -> Result<Bytes> {
    let env = Envelope {
        r#type: msg_type.as_str().to_string(),
        payload: encode_message(payload)?,
    };
    encode_message(&env)
}

/// Parse the outer envelope only.
pub fn decode(buf: &[u8]) -> Result<Envelope> {
    Envelope::decode(buf).map_err(|e| PixioError::DecodingFailed(format!("invalid envelope: {e}")))
}

/// Parse a payload according to its schema.
pub fn decode_payload<M: Message + Default>(payload: &[u8]) -> Result<M> {
    M::decode(payload).map_err(|e| PixioError::DecodingFailed(format!("invalid payload: {e}")))
}

/// Parse an envelope that must carry `expected`, then its payload.
pub fn decode_typed<M: Message + Default>(expected: MessageType, buf: &[u8]) -> Result<M> {
    let env = decode(buf)?;
    if env.r#type != expected.as_str() {
        return Err(PixioError::UnexpectedMessageType {
            expected: expected.as_str().to_string(),
            found: env.r#type,
        });
    }
    decode_payload(&env.payload)
}
