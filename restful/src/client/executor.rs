//! Network transport over `reqwest`.
//!
//! This module provides [`ReqwestTransport`], the default [`Transport`] for
//! [`FetchBackend`](super::FetchBackend).

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument, Span};

use super::encoding::RequestBody;
use super::fetch::{FetchOptions, FetchResponse, Transport};
use crate::error::TransportError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of idle connections kept per host.
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Builder for configuring a [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    default_headers: HeaderMap,
    pool_max_idle_per_host: usize,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Sets the request timeout.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    ///
    /// let transport = ReqwestTransport::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// ```
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request, below any header set on an
    /// endpoint.
    ///
    /// ## Errors
    ///
    /// Returns [`TransportError::InvalidHeader`] if the header name or value
    /// is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, TransportError> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the maximum number of idle connections kept per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Builds the [`ReqwestTransport`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()
            .map_err(TransportError::Request)?;

        Ok(ReqwestTransport { client })
    }
}

/// A [`Transport`] that sends requests with `reqwest`.
///
/// The body is read only when the backend awaits it.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a new builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Creates a transport with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    #[instrument(
        name = "transport_fetch",
        skip_all,
        fields(
            http.method = %options.method,
            http.url = %url,
            http.status_code = tracing::field::Empty,
        )
    )]
    async fn send(&self, url: String, options: FetchOptions) -> Result<FetchResponse, TransportError> {
        let mut request = self.client.request(options.method.to_reqwest(), &url);
        for (name, value) in &options.headers {
            let (name, value) = header_pair(name, value)?;
            request = request.header(name, value);
        }
        if let Some(body) = options.body {
            let body = match body {
                RequestBody::Text(text) => text,
                RequestBody::Value(value) => value.to_string(),
            };
            request = request.body(body);
        }

        let response = request.send().await.map_err(TransportError::Request)?;

        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());
        debug!(status = status.as_u16(), "transport received response");

        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let headers = response.headers().clone();
        Ok(FetchResponse::deferred(
            status.as_u16(),
            status_text,
            headers,
            async move { response.text().await.map_err(TransportError::Request) },
        ))
    }
}

impl Transport for ReqwestTransport {
    fn fetch(
        &self,
        url: String,
        options: FetchOptions,
    ) -> BoxFuture<'_, Result<FetchResponse, TransportError>> {
        self.send(url, options).boxed()
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TransportError> {
    let name = HeaderName::try_from(name)
        .map_err(|e| TransportError::InvalidHeader(format!("invalid header name {name:?}: {e}")))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| TransportError::InvalidHeader(format!("invalid header value: {e}")))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchBackend;
    use crate::config::Headers;
    use crate::endpoint::create_root;
    use crate::error::RequestError;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    struct TestResponse {
        id: u64,
        name: String,
    }

    fn api(server: &MockServer, transport: ReqwestTransport) -> crate::Endpoint {
        create_root(server.uri(), Arc::new(FetchBackend::new(transport)))
    }

    #[tokio::test]
    async fn test_get_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                id: 1,
                name: "Alice".to_string(),
            }))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        let response = api.fork("users/1", true).get(None, None).await.unwrap();

        assert_eq!(response.status_code(), 200);
        let user: TestResponse = serde_json::from_value(response.data().cloned().unwrap()).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Alice");
    }

    #[tokio::test]
    async fn test_query_params_and_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .and(query_param("tags[]", "a"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        api.header("Authorization", "Bearer test-token");

        let params = json!({ "q": "rust", "tags": ["a"] }).as_object().cloned();
        let response = api.fork("search", true).get(params, None).await.unwrap();
        assert_eq!(response.data(), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users"))
            .and(header("content-type", "application/json;charset=UTF-8"))
            .and(body_json(json!({ "name": "Bob" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(TestResponse {
                id: 42,
                name: "Bob".to_string(),
            }))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        let response = api
            .fork("users", true)
            .post(json!({ "name": "Bob" }), None, None)
            .await
            .unwrap();
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.method(), "post");
        assert_eq!(response.data(), Some(&json!({ "id": 42, "name": "Bob" })));
    }

    #[tokio::test]
    async fn test_form_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/settings"))
            .and(body_string("theme=dark"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        let response = api
            .fork("settings", true)
            .put(
                json!({ "theme": "dark" }),
                None,
                Some(Headers::from([(
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                )])),
            )
            .await
            .unwrap();
        assert_eq!(response.status_code(), 204);
        assert_eq!(response.data(), None);
    }

    #[tokio::test]
    async fn test_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-request-id", "abc")
                    .set_body_json(json!({ "error": "nope" })),
            )
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        let err = api.fork("missing", true).get(None, None).await.unwrap_err();

        assert_eq!(err.to_string(), "Not Found");
        let response = err.response().unwrap();
        assert_eq!(response.status_code, 404);
        assert_eq!(response.data, Some(json!({ "error": "nope" })));
        assert_eq!(response.headers.get("x-request-id").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn test_http_error_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/server-error"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        let err = api.fork("server-error", true).get(None, None).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(
            err.response().and_then(|r| r.data.clone()),
            Some(json!("Internal Server Error"))
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_kept_as_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/invalid-json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        let response = api.fork("invalid-json", true).get(None, None).await.unwrap();
        assert_eq!(response.data(), Some(&json!("not valid json")));
    }

    #[tokio::test]
    async fn test_custom_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let api = api(&mock_server, transport);

        let err = api.fork("slow", true).get(None, None).await.unwrap_err();
        match err {
            RequestError::Transport(e) => assert!(e.is_retryable()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_default_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/with-header"))
            .and(header("x-custom-header", "custom-value"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                id: 1,
                name: "CustomHeader".to_string(),
            }))
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::builder()
            .default_header("X-Custom-Header", "custom-value")
            .unwrap()
            .build()
            .unwrap();
        let api = api(&mock_server, transport);

        let response = api.fork("with-header", true).get(None, None).await.unwrap();
        assert_eq!(response.data().unwrap()["name"], json!("CustomHeader"));
    }

    #[test]
    fn test_invalid_default_header() {
        let result = ReqwestTransport::builder().default_header("bad header", "value");
        assert!(matches!(result, Err(TransportError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_header_is_transport_error() {
        let mock_server = MockServer::start().await;
        let api = api(&mock_server, ReqwestTransport::new().unwrap());
        api.header("bad header", "value");

        let err = api.get(None, None).await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Transport(TransportError::InvalidHeader(_))
        ));
    }
}
