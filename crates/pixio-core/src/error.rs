//! Shared error type across Pixio crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
///
/// These strings travel inside the `error` envelope, so renaming one is a
/// wire-breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Payload could not be serialized.
    EncodingFailed,
    /// Malformed envelope or payload.
    DecodingFailed,
    /// Envelope type differs from the one the receiver expected.
    InvalidMessageType,
    /// No handler registered for the envelope type.
    UnsupportedMessageType,
    /// Token invalid or identity mismatch.
    FailedAuth,
    /// Client never completed the handshake.
    HandshakeTimeout,
    /// Caller has no role on the canvas.
    MissingPermissions,
    /// Unknown canvas id.
    CanvasNotFound,
    /// Canvas storage failure.
    FetchingCanvasFailed,
    /// Access-rule storage failure.
    FetchingUserAccessFailed,
    /// Room not joined by this connection.
    RoomNotFound,
    /// Anything else.
    Unexpected,
}

impl ErrorCode {
    /// String representation used in `error` envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EncodingFailed => "ENCODING_FAILED",
            ErrorCode::DecodingFailed => "DECODING_FAILED",
            ErrorCode::InvalidMessageType => "INVALID_MSG_TYPE",
            ErrorCode::UnsupportedMessageType => "UNSUPPORTED_MSG_TYPE",
            ErrorCode::FailedAuth => "FAILED_AUTH",
            ErrorCode::HandshakeTimeout => "HANDSHAKE_TIMEOUT",
            ErrorCode::MissingPermissions => "MISSING_PERMISSIONS",
            ErrorCode::CanvasNotFound => "CANVAS_NOT_FOUND",
            ErrorCode::FetchingCanvasFailed => "CANNOT_FETCH_CANVAS",
            ErrorCode::FetchingUserAccessFailed => "CANNOT_FETCH_USER_ACCESS",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::Unexpected => "UNEXPECTED_ERROR",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PixioError>;

/// Unified error type used by core and hub.
#[derive(Debug, Error)]
pub enum PixioError {
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
    #[error("decoding failed: {0}")]
    DecodingFailed(String),
    #[error("unexpected message type: expected {expected}, found {found}")]
    UnexpectedMessageType { expected: String, found: String },
    #[error("unsupported message type: {0}")]
    UnsupportedMessageType(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("handshake timed out")]
    HandshakeTimeout,
    #[error("missing permissions")]
    MissingPermissions,
    #[error("canvas not found")]
    CanvasNotFound,
    #[error("fetching canvas failed: {0}")]
    FetchingCanvasFailed(String),
    #[error("fetching user access failed: {0}")]
    FetchingUserAccessFailed(String),
    #[error("room not found")]
    RoomNotFound,
    #[error("transport: {0}")]
    Transport(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PixioError {
    /// Map internal error to a stable client-facing code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            PixioError::EncodingFailed(_) => ErrorCode::EncodingFailed,
            PixioError::DecodingFailed(_) => ErrorCode::DecodingFailed,
            PixioError::UnexpectedMessageType { .. } => ErrorCode::InvalidMessageType,
            PixioError::UnsupportedMessageType(_) => ErrorCode::UnsupportedMessageType,
            PixioError::AuthFailed => ErrorCode::FailedAuth,
            PixioError::HandshakeTimeout => ErrorCode::HandshakeTimeout,
            PixioError::MissingPermissions => ErrorCode::MissingPermissions,
            PixioError::CanvasNotFound => ErrorCode::CanvasNotFound,
            PixioError::FetchingCanvasFailed(_) => ErrorCode::FetchingCanvasFailed,
            PixioError::FetchingUserAccessFailed(_) => ErrorCode::FetchingUserAccessFailed,
            PixioError::RoomNotFound => ErrorCode::RoomNotFound,
            PixioError::Transport(_) | PixioError::InvalidConfig(_) | PixioError::Internal(_) => {
                ErrorCode::Unexpected
            }
        }
    }

    /// True for failures that originate upstream of the caller (storage,
    /// internal faults). These are logged as server-side faults.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PixioError::FetchingCanvasFailed(_)
                | PixioError::FetchingUserAccessFailed(_)
                | PixioError::EncodingFailed(_)
                | PixioError::Internal(_)
        )
    }
}
