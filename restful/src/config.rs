//! Per-request configuration snapshots.
//!
//! Every verb call freezes the scope's inherited state into a
//! [`RequestConfig`]. Later changes to the scope tree do not affect a request
//! that has already been issued.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::interceptor::{self, ErrorInterceptor, RequestInterceptor, ResponseInterceptor};
use crate::method::RestMethod;
use crate::path::ResolvedUrl;

/// Header name to value.
pub type Headers = BTreeMap<String, String>;

/// Query parameters.
pub type Params = serde_json::Map<String, Value>;

/// Named scope settings such as the entity identifier.
pub type Settings = BTreeMap<String, Value>;

/// Header name compared case-insensitively when choosing a body encoding.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Looks up a header by name, ignoring ASCII case.
pub fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Sets a header, replacing any header whose name matches ignoring ASCII case.
pub fn insert_header(headers: &mut Headers, name: String, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Layers `nearer` over `headers`. A nearer header replaces every existing
/// header of the same name in any letter case.
pub fn merge_headers(headers: &mut Headers, nearer: impl IntoIterator<Item = (String, String)>) {
    for (name, value) in nearer {
        insert_header(headers, name, value);
    }
}

/// An immutable request description handed to a backend.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    method: RestMethod,
    url: ResolvedUrl,
    headers: Headers,
    params: Option<Params>,
    data: Option<Value>,
    request_interceptors: Vec<RequestInterceptor>,
    response_interceptors: Vec<ResponseInterceptor>,
    error_interceptors: Vec<ErrorInterceptor>,
}

impl RequestConfig {
    /// Starts a configuration with no headers, params, data or interceptors.
    pub fn new(method: RestMethod, url: ResolvedUrl) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            params: None,
            data: None,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            error_interceptors: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: Option<Params>) -> Self {
        self.params = params;
        self
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_interceptors(
        mut self,
        request: Vec<RequestInterceptor>,
        response: Vec<ResponseInterceptor>,
        error: Vec<ErrorInterceptor>,
    ) -> Self {
        self.request_interceptors = request;
        self.response_interceptors = response;
        self.error_interceptors = error;
        self
    }

    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// The request URL, awaitable.
    pub fn url(&self) -> &ResolvedUrl {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn request_interceptors(&self) -> &[RequestInterceptor] {
        &self.request_interceptors
    }

    pub fn response_interceptors(&self) -> &[ResponseInterceptor] {
        &self.response_interceptors
    }

    pub fn error_interceptors(&self) -> &[ErrorInterceptor] {
        &self.error_interceptors
    }

    /// Returns the `Content-Type` header, matched case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        find_header(&self.headers, CONTENT_TYPE)
    }

    /// Waits for the URL and returns the plain request description.
    ///
    /// Interceptors are not applied.
    pub async fn resolve(&self) -> RequestParts {
        RequestParts {
            method: self.method,
            url: self.url.resolve().await,
            headers: self.headers.clone(),
            params: self.params.clone(),
            data: self.data.clone(),
        }
    }

    /// Returns a JSON-safe copy. Interceptors are reduced to their labels.
    pub fn serialize(&self) -> SerializedConfig {
        SerializedConfig {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            params: self.params.clone(),
            data: self.data.clone(),
            request_interceptors: interceptor::labels(&self.request_interceptors),
            response_interceptors: interceptor::labels(&self.response_interceptors),
            error_interceptors: interceptor::labels(&self.error_interceptors),
        }
    }
}

/// The serializable view of a [`RequestConfig`] passed to listeners.
///
/// `url` is skipped during serialization; await it to get the string.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedConfig {
    pub method: RestMethod,
    #[serde(skip)]
    pub url: ResolvedUrl,
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub request_interceptors: Vec<String>,
    pub response_interceptors: Vec<String>,
    pub error_interceptors: Vec<String>,
}

/// A request with its URL resolved, as seen by request interceptors and
/// transports.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub method: RestMethod,
    pub url: String,
    pub headers: Headers,
    pub params: Option<Params>,
    pub data: Option<Value>,
}

impl RequestParts {
    /// Returns the `Content-Type` header, matched case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        find_header(&self.headers, CONTENT_TYPE)
    }
}
