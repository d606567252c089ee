//! Response shapes.
//!
//! Backends produce a [`ResponseEnvelope`]; endpoints wrap it into a
//! [`Response`] bound to the endpoint that issued the request, from which the
//! body can be read raw or as [`Entity`] values.

mod envelope;
mod format;
mod value;

pub use envelope::{RawResponse, ResponseEnvelope};
pub use format::parse_body;
pub use value::{Body, Entity, Response};
