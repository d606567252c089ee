//! Backend adapters.
//!
//! A [`Backend`] turns a [`RequestConfig`] into a [`ResponseEnvelope`]. The
//! crate ships one adapter per transport calling convention:
//!
//! - [`FetchBackend`] for transports that return a future response whose body
//!   is read separately ([`Transport`]);
//! - [`CallbackBackend`] for transports that report completion through a
//!   callback ([`CallbackTransport`]).
//!
//! [`ReqwestTransport`] is the default network transport.
//!
//! Every adapter follows the same pipeline: await the URL, run the request
//! interceptors, encode, call the transport, parse the body, classify the
//! status, then run the response or error interceptors.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use restful::{create_root, FetchBackend, ReqwestTransport};
//! use std::time::Duration;
//!
//! let transport = ReqwestTransport::builder()
//!     .timeout(Duration::from_secs(10))
//!     .default_header("User-Agent", "restful")?
//!     .build()?;
//! let api = create_root("https://api.example.com", Arc::new(FetchBackend::new(transport)));
//! ```

mod callback;
mod encoding;
mod executor;
mod fetch;
mod headers;

use std::fmt;
use std::future::Future;

pub use futures::future::BoxFuture;
use futures::FutureExt;

pub use callback::{
    callback_fn, Callback, CallbackBackend, CallbackOptions, CallbackResponse, CallbackTransport,
    FnCallbackTransport,
};
pub use encoding::{encode_form, encode_query, ContentKind, RequestBody};
pub use executor::{ReqwestTransport, ReqwestTransportBuilder};
pub use fetch::{transport_fn, FetchBackend, FetchOptions, FetchResponse, FnTransport, Transport};
pub use headers::RawHeaders;

use crate::config::{RequestConfig, RequestParts};
use crate::error::RequestError;
use crate::event::Emitter;
use crate::interceptor;
use crate::response::{RawResponse, ResponseEnvelope};

/// Executes requests for endpoints.
///
/// Implementations receive a frozen configuration and an [`Emitter`] for
/// custom events, and must resolve to the canonical envelope for 2xx
/// responses and to [`RequestError::Status`] otherwise.
pub trait Backend: Send + Sync {
    fn request(
        &self,
        config: RequestConfig,
        emitter: Emitter,
    ) -> BoxFuture<'_, Result<ResponseEnvelope, RequestError>>;
}

/// A [`Backend`] built from a closure. See [`backend_fn`].
#[derive(Clone)]
pub struct FnBackend<F>(F);

/// Wraps a closure as a [`Backend`].
///
/// The closure is used as-is: it does not get the interceptor or
/// status-classification pipeline of the bundled adapters.
pub fn backend_fn<F, Fut>(f: F) -> FnBackend<F>
where
    F: Fn(RequestConfig, Emitter) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResponseEnvelope, RequestError>> + Send + 'static,
{
    FnBackend(f)
}

impl<F, Fut> Backend for FnBackend<F>
where
    F: Fn(RequestConfig, Emitter) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResponseEnvelope, RequestError>> + Send + 'static,
{
    fn request(
        &self,
        config: RequestConfig,
        emitter: Emitter,
    ) -> BoxFuture<'_, Result<ResponseEnvelope, RequestError>> {
        (self.0)(config, emitter).boxed()
    }
}

impl<F> fmt::Debug for FnBackend<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnBackend(..)")
    }
}

/// Resolves the URL and runs the request interceptors.
pub(crate) async fn prepare(config: &RequestConfig) -> RequestParts {
    let parts = config.resolve().await;
    interceptor::run_request(config.request_interceptors(), parts)
}

/// Classifies a transport outcome and runs the matching interceptors.
pub(crate) fn settle(
    config: &RequestConfig,
    outcome: Result<RawResponse, RequestError>,
) -> Result<ResponseEnvelope, RequestError> {
    let result = outcome.and_then(|raw| {
        let (message, envelope) = raw.into_envelope(config.method());
        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(RequestError::status(message, envelope))
        }
    });

    match result {
        Ok(envelope) => Ok(interceptor::run_response(
            config.response_interceptors(),
            envelope,
        )),
        Err(error) => Err(interceptor::run_error(config.error_interceptors(), error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Headers;
    use crate::error::TransportError;
    use crate::interceptor::{ErrorInterceptor, ResponseInterceptor};
    use crate::method::RestMethod;
    use crate::path::ResolvedUrl;
    use serde_json::json;

    fn config() -> RequestConfig {
        RequestConfig::new(RestMethod::Get, ResolvedUrl::join(vec!["http://api".into()]))
            .with_interceptors(
                Vec::new(),
                vec![ResponseInterceptor::new("tag", |mut envelope: ResponseEnvelope| {
                    envelope.headers.insert("x-seen".to_string(), "1".to_string());
                    envelope
                })],
                vec![ErrorInterceptor::new("rewrap", |error: RequestError| {
                    match error {
                        RequestError::Status { response, .. } => {
                            RequestError::status("intercepted", *response)
                        }
                        other => other,
                    }
                })],
            )
    }

    fn raw(status: u16, text: &str, body: &str) -> RawResponse {
        RawResponse {
            status,
            status_text: text.to_string(),
            headers: Headers::new(),
            body: Some(body.to_string()),
        }
    }

    #[test]
    fn test_settle_success_runs_response_interceptors() {
        let envelope = settle(&config(), Ok(raw(200, "OK", r#"{"a":1}"#))).unwrap();
        assert_eq!(envelope.data, Some(json!({ "a": 1 })));
        assert_eq!(envelope.method, "get");
        assert_eq!(envelope.headers.get("x-seen").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_settle_status_failure_runs_error_interceptors() {
        let err = settle(&config(), Ok(raw(500, "Internal Server Error", "boom"))).unwrap_err();
        assert_eq!(err.to_string(), "intercepted");
        let response = err.response().unwrap();
        assert_eq!(response.status_code, 500);
        assert_eq!(response.data, Some(json!("boom")));
        assert!(!response.headers.contains_key("x-seen"));
    }

    #[test]
    fn test_settle_transport_failure_passes_through() {
        let err = settle(
            &config(),
            Err(TransportError::Connection("refused".to_string()).into()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::Connection(_))
        ));
    }
}
