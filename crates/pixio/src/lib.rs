//! Top-level facade crate for Pixio's realtime hub.
//!
//! Re-exports the wire contracts and the hub library so users can depend on a single crate.

pub mod core {
    pub use pixio_core::*;
}

pub mod hub {
    pub use pixio_hub::*;
}
