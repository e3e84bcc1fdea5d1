//! Pixio core: transport-agnostic wire contracts and error types.
//!
//! This crate defines the envelope codec, the message catalog, and the error
//! surface shared by the hub and any client tooling. It carries no transport
//! or runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `PixioError`/`Result`, so hostile frames can never crash the
//! process that decodes them.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, PixioError, Result};
