//! p1ext error types.
//!
//! The taxonomy mirrors the failure modes of the extension protocol:
//! a rejected rebind, a transport that dropped mid-operation, and a
//! push configuration that fails validation before serialization.
//!
//! Deferred push configuration (set while unauthenticated) is a normal
//! queued state, not an error, and never appears here.

use thiserror::Error;

/// p1ext errors.
#[derive(Error, Debug)]
pub enum P1Error {
    /// Server declined the rebind request (invalid or expired session).
    ///
    /// Recovery is a caller decision: fall back to standard
    /// authentication on the next connection attempt. The saved
    /// session record is left untouched.
    #[error("Rebind rejected: {0}")]
    RebindRejected(String),

    /// Connection dropped while an operation was in flight.
    ///
    /// Surfaces as failure on an in-flight authentication attempt and
    /// as `Failed` on any pending [`Receipt`](crate::Receipt).
    #[error("Transport disconnected: {0}")]
    TransportDisconnected(String),

    /// Push configuration value rejected at construction time.
    ///
    /// An unrecognized field or attribute value fails fast; a partially
    /// serialized configuration is never produced.
    #[error("Invalid push configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed JID string.
    #[error("Invalid JID: {0}")]
    InvalidJid(String),

    /// Protocol-level error (stanza received in the wrong state, or a
    /// malformed terminal stanza).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Session record store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for p1ext operations
pub type Result<T> = std::result::Result<T, P1Error>;

impl From<toml::de::Error> for P1Error {
    fn from(err: toml::de::Error) -> Self {
        P1Error::Config(err.to_string())
    }
}
