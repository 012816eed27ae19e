//! Signaling wire protocol (JSON over WebSocket text frames).
//!
//! Two halves:
//! - `signal`: the routed envelope (register / offer / answer / ICE / anything
//!   else the relay forwards). The payload beyond the routing fields is an
//!   opaque JSON map the relay never inspects.
//! - `control`: replies the relay itself originates (`registered`, `error`).
//!
//! All parsers are panic-free: malformed input is reported as `RelayError`
//! so one hostile client cannot take the relay down.

pub mod control;
pub mod signal;

pub use signal::Envelope;
