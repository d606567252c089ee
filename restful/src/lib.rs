//! Hierarchical REST API client builder.
//!
//! The `restful` crate models an API as a tree of endpoints. Each endpoint
//! owns a scope that inherits configuration from its ancestors and issues
//! requests through a pluggable backend.
//!
//! ## Features
//!
//! - **Inherited configuration**: headers merge from root to leaf, while
//!   interceptors and settings are taken from the nearest scope that sets them
//! - **Lazy URLs**: path segments may be futures; URLs resolve when awaited
//! - **Bubbling events**: `response` and `error` events reach every ancestor
//! - **Interceptors**: rewrite requests, responses and errors per subtree
//! - **Pluggable backends**: future-style and callback-style transport
//!   adapters, with a `reqwest` transport included
//! - **Entities**: wrap response bodies into navigable entities
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use restful::{create_root, Event, FetchBackend, ReqwestTransport, ERROR_EVENT};
//!
//! let api = create_root(
//!     "https://api.example.com",
//!     Arc::new(FetchBackend::new(ReqwestTransport::new()?)),
//! );
//! api.header("Authorization", "Bearer sk-xxx");
//! api.on(ERROR_EVENT, |event| {
//!     if let Event::Error { error, .. } = event {
//!         eprintln!("request failed: {error}");
//!     }
//!     Ok(())
//! });
//!
//! let users = api.fork("users", true);
//! let response = users.get(None, None).await?;
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod interceptor;
pub mod method;
pub mod path;
pub mod resource;
pub mod response;
pub mod scope;

// Re-exports for convenience
pub use client::{
    backend_fn, callback_fn, transport_fn, Backend, CallbackBackend, CallbackTransport,
    FetchBackend, FetchResponse, ReqwestTransport, Transport,
};
pub use config::{Headers, Params, RequestConfig, RequestParts, SerializedConfig};
pub use endpoint::{
    create_root, Endpoint, DEFAULT_CONTENT_TYPE, DEFAULT_IDENTIFIER, ENTITY_IDENTIFIER_KEY,
};
pub use error::{ListenerError, RequestError, TransportError};
pub use event::{Emitter, Event, Listener, ListenerId, ERROR_EVENT, RESPONSE_EVENT};
pub use interceptor::{ErrorInterceptor, RequestInterceptor, ResponseInterceptor};
pub use method::RestMethod;
pub use path::{ForkPath, PathSegment, ResolvedUrl, PATH_SEPARATOR};
pub use resource::{Collection, Member};
pub use response::{Body, Entity, Response, ResponseEnvelope};
pub use scope::{MergeStrategy, Scope, ScopeKey};
