//! sigrelay core: wire-level signaling contracts and error types.
//!
//! This crate defines the JSON envelope exchanged between signaling clients
//! and the relay, plus the shared error surface. It intentionally carries no
//! transport or runtime dependencies so it can be reused by the relay binary,
//! client tooling, and tests alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelayError`/`Result` so the relay
//! process does not crash on malformed input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{RelayError, Result};
