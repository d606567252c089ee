//! Layered error types for the crate.
//!
//! - [`RequestError`] - Top-level error returned by every verb call
//! - [`TransportError`] - Failures surfaced by the underlying transport
//! - [`ListenerError`] - A listener aborting event propagation

mod listener_error;
mod request_error;
mod transport_error;

pub use listener_error::ListenerError;
pub use request_error::RequestError;
pub use transport_error::TransportError;
