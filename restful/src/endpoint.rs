//! Endpoints: scopes that can issue requests.
//!
//! An [`Endpoint`] is a [`Scope`] paired with a shared [`Backend`]. All
//! configuration lives in the scope, so forking an endpoint is cheap and a
//! child sees later changes made to its ancestors.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use restful::{create_root, FetchBackend, ReqwestTransport};
//!
//! let transport = ReqwestTransport::new()?;
//! let api = create_root("https://api.example.com", Arc::new(FetchBackend::new(transport)));
//! api.header("Authorization", "Bearer sk-xxx");
//!
//! let users = api.fork("users", true);
//! let response = users.get(None, None).await?;
//! println!("{} {:?}", response.status_code(), response.data());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, Span};

use crate::client::Backend;
use crate::config::{find_header, merge_headers, Headers, Params, RequestConfig, CONTENT_TYPE};
use crate::error::{ListenerError, RequestError};
use crate::event::{Emitter, Event, ListenerId};
use crate::interceptor::{ErrorInterceptor, RequestInterceptor, ResponseInterceptor};
use crate::method::RestMethod;
use crate::path::{ForkPath, PathSegment, ResolvedUrl};
use crate::response::Response;
use crate::scope::Scope;

/// `Content-Type` set on requests that carry data and have none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Setting that names the field holding an entity's id.
pub const ENTITY_IDENTIFIER_KEY: &str = "entityIdentifier";

/// Identifier field used when no scope sets [`ENTITY_IDENTIFIER_KEY`].
pub const DEFAULT_IDENTIFIER: &str = "id";

/// Creates the root endpoint of an API.
///
/// `base` becomes the single root path segment; pass a
/// [`PathSegment::pending`] when the base URL is only known later. The root
/// scope identifies entities by `"id"`.
pub fn create_root(base: impl Into<PathSegment>, backend: Arc<dyn Backend>) -> Endpoint {
    let scope = Scope::root();
    scope.push_segment(base);
    scope.assign_config(ENTITY_IDENTIFIER_KEY, DEFAULT_IDENTIFIER);
    Endpoint::new(backend, scope)
}

/// A node of the API tree that can issue HTTP requests.
#[derive(Clone)]
pub struct Endpoint {
    scope: Scope,
    backend: Arc<dyn Backend>,
}

impl Endpoint {
    /// Binds a backend to an existing scope.
    pub fn new(backend: Arc<dyn Backend>, scope: Scope) -> Self {
        Self { scope, backend }
    }

    /// Creates a child endpoint sharing this endpoint's backend.
    ///
    /// With `relative` the child's path extends this one; otherwise `path`
    /// replaces it. String paths are split on `/`.
    pub fn fork(&self, path: impl Into<ForkPath>, relative: bool) -> Self {
        Self {
            scope: self.scope.fork(path, relative),
            backend: self.backend.clone(),
        }
    }

    /// Returns the underlying scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Issues a `GET`.
    pub fn get(
        &self,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.dispatch(RestMethod::Get, None, params, headers)
    }

    /// Issues a `HEAD`.
    pub fn head(
        &self,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.dispatch(RestMethod::Head, None, params, headers)
    }

    /// Issues a `POST`.
    pub fn post(
        &self,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.dispatch(RestMethod::Post, data.into(), params, headers)
    }

    /// Issues a `PUT`.
    pub fn put(
        &self,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.dispatch(RestMethod::Put, data.into(), params, headers)
    }

    /// Issues a `PATCH`.
    pub fn patch(
        &self,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.dispatch(RestMethod::Patch, data.into(), params, headers)
    }

    /// Issues a `DELETE`.
    pub fn delete(
        &self,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.dispatch(RestMethod::Delete, data.into(), params, headers)
    }

    /// Snapshots the scope into a request configuration.
    ///
    /// Call-supplied headers override inherited ones of the same name in any
    /// letter case. A JSON `null` counts as no data. A request with data and
    /// no `Content-Type` gets [`DEFAULT_CONTENT_TYPE`].
    pub fn request_config(
        &self,
        method: RestMethod,
        data: Option<Value>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> RequestConfig {
        let data = data.filter(|data| !data.is_null());
        let mut merged = self.scope.headers();
        merge_headers(&mut merged, headers.unwrap_or_default());
        if data.is_some() && find_header(&merged, CONTENT_TYPE).is_none() {
            merged.insert(CONTENT_TYPE.to_string(), DEFAULT_CONTENT_TYPE.to_string());
        }

        RequestConfig::new(method, self.url())
            .with_headers(merged)
            .with_params(params)
            .with_data(data)
            .with_interceptors(
                self.scope.request_interceptors(),
                self.scope.response_interceptors(),
                self.scope.error_interceptors(),
            )
    }

    // The config is built before the future is returned so that changes made
    // to the scope while the request is pending do not leak into it.
    fn dispatch(
        &self,
        method: RestMethod,
        data: Option<Value>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        let config = self.request_config(method, data, params, headers);
        self.clone().send(config)
    }

    #[instrument(
        name = "restful_request",
        skip_all,
        fields(
            http.method = %config.method(),
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn send(self, config: RequestConfig) -> Result<Response, RequestError> {
        let serialized = config.serialize();
        let result = self
            .backend
            .request(config, Emitter::new(self.scope.clone()))
            .await;

        let span = Span::current();
        if let Some(url) = serialized.url.peek() {
            span.record("http.url", url);
        }

        match result {
            Ok(envelope) => {
                span.record("http.status_code", envelope.status_code);
                span.record("otel.status_code", "OK");

                let response = Response::new(envelope, self);
                response.endpoint().scope.emit(&Event::Response {
                    response: &response,
                    config: &serialized,
                })?;
                Ok(response)
            }
            Err(error) => {
                let code = error.status_code();
                if let Some(code) = code {
                    span.record("http.status_code", code);
                }
                let otel_status = match code {
                    Some(code) if code < 500 => "UNSET",
                    _ => "ERROR",
                };
                span.record("otel.status_code", otel_status);
                debug!(error = %error, "request failed");

                self.scope.emit(&Event::Error {
                    error: &error,
                    config: &serialized,
                })?;
                Err(error)
            }
        }
    }

    /// Adds a request interceptor on this endpoint.
    pub fn add_request_interceptor(&self, interceptor: RequestInterceptor) -> &Self {
        self.scope.push_request_interceptor(interceptor);
        self
    }

    /// Adds a response interceptor on this endpoint.
    pub fn add_response_interceptor(&self, interceptor: ResponseInterceptor) -> &Self {
        self.scope.push_response_interceptor(interceptor);
        self
    }

    /// Adds an error interceptor on this endpoint.
    pub fn add_error_interceptor(&self, interceptor: ErrorInterceptor) -> &Self {
        self.scope.push_error_interceptor(interceptor);
        self
    }

    /// Sets a header on this endpoint. Descendants inherit it.
    pub fn header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.scope.assign_header(name, value);
        self
    }

    /// Returns the headers this endpoint would send, inherited ones included.
    pub fn headers(&self) -> Headers {
        self.scope.headers()
    }

    /// Returns the name of the field holding an entity's id.
    pub fn identifier(&self) -> String {
        self.scope
            .config_value(ENTITY_IDENTIFIER_KEY)
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_IDENTIFIER.to_string())
    }

    /// Sets the identifier field for this endpoint and its descendants.
    pub fn set_identifier(&self, name: impl Into<String>) -> &Self {
        self.scope.assign_config(ENTITY_IDENTIFIER_KEY, name.into());
        self
    }

    /// Returns this endpoint's URL, resolved once every path segment is known.
    pub fn url(&self) -> ResolvedUrl {
        ResolvedUrl::join(self.scope.path())
    }

    pub fn path(&self) -> Vec<PathSegment> {
        self.scope.path()
    }

    /// Registers a listener on this endpoint.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.scope.on(name, listener)
    }

    /// Registers a listener that fires at most once.
    pub fn once<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.scope.once(name, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.scope.off(id)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
