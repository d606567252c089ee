//! Event listener errors.

use thiserror::Error;

/// Returned by a listener to stop an event from bubbling further.
///
/// The error travels synchronously out of [`Scope::emit`](crate::Scope::emit)
/// and, during a verb call, replaces the call's result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Listener aborted event propagation: {message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates a listener error with the given reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the reason given by the listener.
    pub fn message(&self) -> &str {
        &self.message
    }
}
