//! Top-level request error type.

use super::{ListenerError, TransportError};
use crate::response::ResponseEnvelope;
use thiserror::Error;

/// Error returned by endpoint verb calls and backend adapters.
///
/// Non-2xx responses are not transport failures: they carry the full
/// canonical envelope so callers can branch on the status code or inspect
/// the parsed body without re-parsing transport internals.
///
/// ## Examples
///
/// ```rust,ignore
/// use restful::RequestError;
///
/// match client.fork("users", true).get(None, None).await {
///     Ok(response) => println!("{:?}", response.data()),
///     Err(RequestError::Status { message, response }) => {
///         eprintln!("{} ({})", message, response.status_code);
///     }
///     Err(other) => eprintln!("request failed: {other}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum RequestError {
    /// The transport failed before producing a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a status outside `[200, 300)`.
    #[error("{message}")]
    Status {
        /// Status text reported by the transport.
        message: String,
        /// The canonical envelope built from the failed response.
        response: Box<ResponseEnvelope>,
    },

    /// A listener stopped an event from bubbling.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl RequestError {
    /// Creates a status error from a failed envelope.
    pub fn status(message: impl Into<String>, response: ResponseEnvelope) -> Self {
        Self::Status {
            message: message.into(),
            response: Box::new(response),
        }
    }

    /// Returns the canonical envelope for status errors.
    pub fn response(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the HTTP status code, if the failure carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { response, .. } => Some(response.status_code),
            Self::Transport(e) => e.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if the server answered with a non-2xx status.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}
