//! Top-level facade crate for sigrelay.
//!
//! Re-exports core types and the relay library so users can depend on a single crate.

pub mod core {
    pub use sigrelay_core::*;
}

pub mod relay {
    pub use sigrelay_relay::*;
}
