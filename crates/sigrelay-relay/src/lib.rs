//! sigrelay relay library entry.
//!
//! This crate wires the WebSocket transport, client registry, and signal
//! router into the relay process. It is intended to be consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod relay;
pub mod router;
pub mod transport;
