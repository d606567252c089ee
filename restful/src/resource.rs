//! Resource-style navigation over endpoints.
//!
//! [`Member`] wraps an endpoint that addresses one resource, [`Collection`]
//! one that addresses a list of resources. Both dereference to [`Endpoint`],
//! so every verb and setting remains available.
//!
//! ```rust,ignore
//! let api = Member::new(create_root("https://api.example.com", backend));
//! let comments = api.one("users", 1).all("comments");
//! let response = comments.get(3, None, None).await?; // GET /users/1/comments/3
//! ```

use std::future::Future;
use std::ops::Deref;

use serde_json::Value;

use crate::config::{Headers, Params};
use crate::endpoint::Endpoint;
use crate::error::RequestError;
use crate::path::{ForkPath, PathSegment};
use crate::response::Response;

/// An endpoint addressing a single resource.
#[derive(Debug, Clone)]
pub struct Member(Endpoint);

impl Member {
    pub fn new(endpoint: Endpoint) -> Self {
        Self(endpoint)
    }

    /// The collection `name` below this member.
    pub fn all(&self, name: &str) -> Collection {
        Collection(self.0.fork(name, true))
    }

    /// The member `id` of the collection `name` below this member.
    pub fn one(&self, name: &str, id: impl Into<PathSegment>) -> Member {
        let mut segments = ForkPath::from(name).into_segments();
        segments.push(id.into());
        Member(self.0.fork(segments, true))
    }

    /// An arbitrary path, relative to this member or absolute.
    pub fn custom(&self, name: &str, relative: bool) -> Member {
        Member(self.0.fork(name, relative))
    }

    /// Sets the identifier field; fluent like [`Endpoint::set_identifier`].
    pub fn set_identifier(&self, name: impl Into<String>) -> &Self {
        self.0.set_identifier(name);
        self
    }

    pub fn header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.0.header(name, value);
        self
    }

    pub fn into_endpoint(self) -> Endpoint {
        self.0
    }
}

impl Deref for Member {
    type Target = Endpoint;

    fn deref(&self) -> &Endpoint {
        &self.0
    }
}

impl From<Endpoint> for Member {
    fn from(endpoint: Endpoint) -> Self {
        Self(endpoint)
    }
}

/// An endpoint addressing a list of resources.
///
/// The id-taking verbs act on the member `id` of the collection.
#[derive(Debug, Clone)]
pub struct Collection(Endpoint);

impl Collection {
    pub fn new(endpoint: Endpoint) -> Self {
        Self(endpoint)
    }

    fn member(&self, id: impl Into<PathSegment>) -> Endpoint {
        self.0.fork(id.into(), true)
    }

    /// `GET` on the collection itself.
    pub fn get_all(
        &self,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.0.get(params, headers)
    }

    pub fn get(
        &self,
        id: impl Into<PathSegment>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.member(id).get(params, headers)
    }

    pub fn head(
        &self,
        id: impl Into<PathSegment>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.member(id).head(params, headers)
    }

    pub fn put(
        &self,
        id: impl Into<PathSegment>,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.member(id).put(data, params, headers)
    }

    pub fn patch(
        &self,
        id: impl Into<PathSegment>,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.member(id).patch(data, params, headers)
    }

    pub fn delete(
        &self,
        id: impl Into<PathSegment>,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.member(id).delete(data, params, headers)
    }

    /// `POST` to the collection itself.
    pub fn post(
        &self,
        data: impl Into<Option<Value>>,
        params: Option<Params>,
        headers: Option<Headers>,
    ) -> impl Future<Output = Result<Response, RequestError>> + Send + 'static {
        self.0.post(data, params, headers)
    }

    pub fn custom(&self, name: &str, relative: bool) -> Member {
        Member(self.0.fork(name, relative))
    }

    /// Sets the identifier field; fluent like [`Endpoint::set_identifier`].
    pub fn set_identifier(&self, name: impl Into<String>) -> &Self {
        self.0.set_identifier(name);
        self
    }

    pub fn header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.0.header(name, value);
        self
    }

    pub fn into_endpoint(self) -> Endpoint {
        self.0
    }
}

impl Deref for Collection {
    type Target = Endpoint;

    fn deref(&self) -> &Endpoint {
        &self.0
    }
}

impl From<Endpoint> for Collection {
    fn from(endpoint: Endpoint) -> Self {
        Self(endpoint)
    }
}
