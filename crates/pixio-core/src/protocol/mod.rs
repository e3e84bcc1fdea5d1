//! Wire protocol: one binary frame carries exactly one [`Envelope`].
//!
//! - `envelope`: the outer `{type, payload}` wrapper and its codec.
//! - `messages`: the closed set of message types and their payload schemas.
//!
//! Both layers are Protocol Buffers encoded. Decoding is panic-free:
//! malformed input is reported as `PixioError::DecodingFailed`.

pub mod envelope;
pub mod messages;

pub use envelope::{decode, decode_payload, decode_typed, encode, Envelope};
pub use messages::MessageType;
