//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler and the per-connection session state
//! machine that feeds the signal router.

pub mod ws;
