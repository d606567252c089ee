//! Transport-level errors.

use thiserror::Error;

/// Errors from the transport layer.
///
/// These are passed through the backend adapters unchanged: the engine
/// never retries or reinterprets them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed due to network or protocol error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to establish connection to the server.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A header name or value could not be represented on the wire.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A callback-style transport dropped its completion callback without
    /// calling it.
    #[error("Transport dropped the completion callback")]
    CallbackDropped,
}

impl TransportError {
    /// Returns `true` if this error is worth retrying at a higher layer.
    ///
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::InvalidHeader(_) | Self::CallbackDropped => false,
        }
    }

    /// Returns the HTTP status code if the transport reported one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
