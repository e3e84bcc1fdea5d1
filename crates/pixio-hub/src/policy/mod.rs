//! Policy layer (upgrade-time checks).
//!
//! Compiles configuration into lookup structures the transport consults
//! before a socket is upgraded.

pub mod origin;

pub use origin::OriginPolicy;
