//! Shared error type across sigrelay crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by core and relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// First message on a connection was not a valid `register`.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    /// Message failed structural parsing (or re-encoding).
    #[error("bad message: {0}")]
    BadMessage(String),
    /// Config failed strict parsing or range validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Unsupported config schema version.
    #[error("unsupported config version")]
    UnsupportedVersion,
    /// Startup / wiring failure.
    #[error("internal: {0}")]
    Internal(String),
}
