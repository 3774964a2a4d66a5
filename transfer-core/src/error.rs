//! Error types for the reliable-transfer protocol.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a transfer session.
#[derive(Debug, Error)]
pub enum Error {
    /// A handshake record was missing a required field.
    #[error("negotiation failed: {0}")]
    NegotiationFailure(String),

    /// The peer closed the channel, or channel I/O failed, outside of a
    /// graceful teardown.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// The payload source could not be read before the transfer started.
    #[error("payload source missing: {0}")]
    PayloadSourceMissing(String),

    /// Underlying I/O error from the duplex stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
