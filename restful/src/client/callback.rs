//! Adapter for callback-style transports.

use std::fmt;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::debug;

use super::encoding::{ContentKind, RequestBody};
use super::headers::RawHeaders;
use super::{prepare, settle, Backend};
use crate::config::{Headers, Params, RequestConfig, RequestParts};
use crate::error::{RequestError, TransportError};
use crate::event::Emitter;
use crate::method::RestMethod;
use crate::response::{RawResponse, ResponseEnvelope};

/// A request as handed to a [`CallbackTransport`].
///
/// Query parameters travel separately from the URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOptions {
    pub url: String,
    pub method: RestMethod,
    pub headers: Headers,
    pub query: Option<Params>,
    pub body: Option<RequestBody>,
}

/// Response metadata reported by a [`CallbackTransport`].
#[derive(Debug, Clone)]
pub struct CallbackResponse {
    pub status_code: u16,
    pub status_message: String,
    pub headers: RawHeaders,
}

/// Completion callback: the response metadata and raw body, or a transport
/// failure.
pub type Callback =
    Box<dyn FnOnce(Result<(CallbackResponse, Option<String>), TransportError>) + Send>;

/// A transport called as `call(options, done)`.
///
/// `done` may be invoked from any thread, synchronously or later. Dropping it
/// without calling it fails the request with
/// [`TransportError::CallbackDropped`].
pub trait CallbackTransport: Send + Sync {
    fn call(&self, options: CallbackOptions, done: Callback);
}

/// A [`CallbackTransport`] built from a closure. See [`callback_fn`].
#[derive(Clone)]
pub struct FnCallbackTransport<F>(F);

/// Wraps a closure as a [`CallbackTransport`].
pub fn callback_fn<F>(f: F) -> FnCallbackTransport<F>
where
    F: Fn(CallbackOptions, Callback) + Send + Sync,
{
    FnCallbackTransport(f)
}

impl<F> CallbackTransport for FnCallbackTransport<F>
where
    F: Fn(CallbackOptions, Callback) + Send + Sync,
{
    fn call(&self, options: CallbackOptions, done: Callback) {
        (self.0)(options, done)
    }
}

impl<F> fmt::Debug for FnCallbackTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCallbackTransport(..)")
    }
}

/// Adapts a [`CallbackTransport`] to the [`Backend`] contract.
///
/// JSON data is stringified; any other data is handed over unchanged for the
/// transport to encode.
#[derive(Debug, Clone)]
pub struct CallbackBackend<T> {
    transport: T,
}

impl<T: CallbackTransport> CallbackBackend<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn send(&self, parts: RequestParts) -> Result<RawResponse, RequestError> {
        let body = match (ContentKind::detect(parts.content_type()), parts.data) {
            (_, None) => None,
            (ContentKind::Json, Some(data)) => Some(RequestBody::Text(serde_json::to_string(&data)?)),
            (_, Some(data)) => Some(RequestBody::Value(data)),
        };
        let options = CallbackOptions {
            url: parts.url,
            method: parts.method,
            headers: parts.headers,
            query: parts.params,
            body,
        };

        debug!(method = %options.method, url = %options.url, "dispatching to callback transport");
        let (tx, rx) = oneshot::channel();
        self.transport.call(
            options,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        let (response, body) = rx.await.map_err(|_| TransportError::CallbackDropped)??;
        Ok(RawResponse {
            status: response.status_code,
            status_text: response.status_message,
            headers: response.headers.into_map(),
            body,
        })
    }
}

impl<T: CallbackTransport> Backend for CallbackBackend<T> {
    fn request(
        &self,
        config: RequestConfig,
        _emitter: Emitter,
    ) -> BoxFuture<'_, Result<ResponseEnvelope, RequestError>> {
        async move {
            let parts = prepare(&config).await;
            let outcome = self.send(parts).await;
            settle(&config, outcome)
        }
        .boxed()
    }
}
