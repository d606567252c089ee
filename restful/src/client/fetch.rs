//! Adapter for future-returning transports.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::encoding::{append_query, encode_body, ContentKind, RequestBody};
use super::headers::RawHeaders;
use super::{prepare, settle, Backend};
use crate::config::{Headers, RequestConfig, RequestParts};
use crate::error::{RequestError, TransportError};
use crate::event::Emitter;
use crate::method::RestMethod;
use crate::response::{RawResponse, ResponseEnvelope};

/// Everything but the URL of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub method: RestMethod,
    pub headers: Headers,
    pub body: Option<RequestBody>,
}

/// A transport response whose body has not been read yet.
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: RawHeaders,
    body: BoxFuture<'static, Result<String, TransportError>>,
}

impl FetchResponse {
    /// A response whose body is already in memory.
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: impl Into<RawHeaders>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        Self::deferred(status, status_text, headers, async move {
            Ok::<_, TransportError>(body)
        })
    }

    /// A response whose body is read by awaiting `body`.
    pub fn deferred<F>(
        status: u16,
        status_text: impl Into<String>,
        headers: impl Into<RawHeaders>,
        body: F,
    ) -> Self
    where
        F: Future<Output = Result<String, TransportError>> + Send + 'static,
    {
        Self {
            status,
            status_text: status_text.into(),
            headers: headers.into(),
            body: body.boxed(),
        }
    }

    /// Reads the body.
    pub async fn into_raw(self) -> Result<RawResponse, TransportError> {
        let body = self.body.await?;
        Ok(RawResponse {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers.into_map(),
            body: Some(body),
        })
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A transport called as `fetch(url, options)`.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        url: String,
        options: FetchOptions,
    ) -> BoxFuture<'_, Result<FetchResponse, TransportError>>;
}

/// A [`Transport`] built from a closure. See [`transport_fn`].
#[derive(Clone)]
pub struct FnTransport<F>(F);

/// Wraps a closure as a [`Transport`].
///
/// ```rust,ignore
/// let transport = transport_fn(|url, options| async move {
///     Ok(FetchResponse::new(200, "OK", Headers::new(), r#"{"id":1}"#))
/// });
/// let backend = FetchBackend::new(transport);
/// ```
pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(String, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, TransportError>> + Send + 'static,
{
    FnTransport(f)
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(String, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse, TransportError>> + Send + 'static,
{
    fn fetch(
        &self,
        url: String,
        options: FetchOptions,
    ) -> BoxFuture<'_, Result<FetchResponse, TransportError>> {
        (self.0)(url, options).boxed()
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransport(..)")
    }
}

/// Adapts a [`Transport`] to the [`Backend`] contract.
///
/// Params are appended to the URL as a query string. The body is encoded by
/// `Content-Type`: JSON is stringified, form data is bracket-encoded, and
/// other data is passed through.
#[derive(Debug, Clone)]
pub struct FetchBackend<T> {
    transport: T,
}

impl<T: Transport> FetchBackend<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&self, parts: RequestParts) -> Result<RawResponse, RequestError> {
        let kind = ContentKind::detect(parts.content_type());
        let body = parts
            .data
            .map(|data| encode_body(kind, data))
            .transpose()?;
        let url = append_query(parts.url, parts.params.as_ref());

        debug!(method = %parts.method, url = %url, "dispatching to transport");
        let response = self
            .transport
            .fetch(
                url,
                FetchOptions {
                    method: parts.method,
                    headers: parts.headers,
                    body,
                },
            )
            .await?;
        Ok(response.into_raw().await?)
    }
}

impl<T: Transport> Backend for FetchBackend<T> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::RequestInterceptor;
    use crate::path::{PathSegment, ResolvedUrl};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    type Calls = Arc<Mutex<Vec<(String, FetchOptions)>>>;

    fn transport(status: u16, text: &'static str, body: &'static str) -> (impl Transport, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let transport = transport_fn(move |url, options| {
            sink.lock().push((url, options));
            futures::future::ready(Ok(FetchResponse::new(
                status,
                text,
                vec![("test".to_string(), "here".to_string())],
                body,
            )))
        });
        (transport, calls)
    }

    fn config(method: RestMethod) -> RequestConfig {
        RequestConfig::new(method, ResolvedUrl::join(vec![PathSegment::from("/url")]))
    }

    #[tokio::test]
    async fn test_no_content_round_trip() {
        let (transport, _) = transport(204, "No Content", "");
        let backend = FetchBackend::new(transport);
        let scope = crate::scope::Scope::root();

        let envelope = backend
            .request(config(RestMethod::Get), Emitter::new(scope))
            .await
            .unwrap();
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.status_code, 204);
        assert_eq!(envelope.method, "get");
        assert_eq!(envelope.headers.get("test").map(String::as_str), Some("here"));
    }

    #[tokio::test]
    async fn test_json_body_and_query_string() {
        let (transport, calls) = transport(200, "OK", r#"{"content":"Yes"}"#);
        let backend = FetchBackend::new(transport);
        let config = config(RestMethod::Post)
            .with_headers(Headers::from([(
                "Content-Type".to_string(),
                "application/json;charset=UTF-8".to_string(),
            )]))
            .with_params(Some(json!({ "asc": 1 }).as_object().cloned().unwrap_or_default()))
            .with_data(Some(json!({ "me": "you" })));

        let envelope = backend
            .request(config, Emitter::new(crate::scope::Scope::root()))
            .await
            .unwrap();
        assert_eq!(envelope.data, Some(json!({ "content": "Yes" })));

        let calls = calls.lock();
        let (url, options) = &calls[0];
        assert_eq!(url, "url?asc=1");
        assert_eq!(options.method, RestMethod::Post);
        assert_eq!(options.body, Some(RequestBody::Text(r#"{"me":"you"}"#.to_string())));
    }

    #[tokio::test]
    async fn test_form_body() {
        let (transport, calls) = transport(201, "Created", "");
        let backend = FetchBackend::new(transport);
        let config = config(RestMethod::Put)
            .with_headers(Headers::from([(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )]))
            .with_data(Some(json!({ "tags": ["a", "b"] })));

        backend
            .request(config, Emitter::new(crate::scope::Scope::root()))
            .await
            .unwrap();
        assert_eq!(
            calls.lock()[0].1.body,
            Some(RequestBody::Text("tags%5B%5D=a&tags%5B%5D=b".to_string()))
        );
    }

    #[tokio::test]
    async fn test_not_found_rejects_with_envelope() {
        let (transport, _) = transport(404, "Not Found", r#"{"content":"Yes"}"#);
        let backend = FetchBackend::new(transport);

        let err = backend
            .request(config(RestMethod::Get), Emitter::new(crate::scope::Scope::root()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not Found");
        let response = err.response().unwrap();
        assert_eq!(response.status_code, 404);
        assert_eq!(response.data, Some(json!({ "content": "Yes" })));
        assert_eq!(response.headers.get("test").map(String::as_str), Some("here"));
    }

    #[tokio::test]
    async fn test_request_interceptors_see_resolved_url() {
        let (transport, calls) = transport(200, "OK", "");
        let backend = FetchBackend::new(transport);
        let config = config(RestMethod::Get).with_interceptors(
            vec![RequestInterceptor::new("version", |mut parts: RequestParts| {
                parts.url = format!("{}/v2", parts.url);
                parts.headers.insert("X-Version".to_string(), "2".to_string());
                parts
            })],
            Vec::new(),
            Vec::new(),
        );

        backend
            .request(config, Emitter::new(crate::scope::Scope::root()))
            .await
            .unwrap();
        let calls = calls.lock();
        assert_eq!(calls[0].0, "url/v2");
        assert_eq!(calls[0].1.headers.get("X-Version").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let backend = FetchBackend::new(transport_fn(|_, _| async {
            Err::<FetchResponse, _>(TransportError::Connection("refused".to_string()))
        }));
        let err = backend
            .request(config(RestMethod::Get), Emitter::new(crate::scope::Scope::root()))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Transport(TransportError::Connection(_))));
    }

    #[tokio::test]
    async fn test_deferred_body_error() {
        let backend = FetchBackend::new(transport_fn(|_, _| async {
            Ok::<_, TransportError>(FetchResponse::deferred(200, "OK", Headers::new(), async {
                Err::<String, _>(TransportError::Connection("reset".to_string()))
            }))
        }));
        let err = backend
            .request(config(RestMethod::Get), Emitter::new(crate::scope::Scope::root()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Connection failed: reset");
    }
}
