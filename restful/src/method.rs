//! HTTP verbs issued by endpoints.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// HTTP methods an [`Endpoint`](crate::Endpoint) can issue.
///
/// ## Examples
///
/// ```rust
/// use restful::RestMethod;
///
/// let method = RestMethod::Post;
/// assert!(method.carries_data());
/// assert_eq!(method.as_lowercase(), "post");
///
/// let parsed: RestMethod = "DELETE".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Delete);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    /// HTTP GET - Retrieve a resource.
    Get,
    /// HTTP HEAD - Retrieve headers only.
    Head,
    /// HTTP POST - Create a resource or trigger an action.
    Post,
    /// HTTP PUT - Replace a resource entirely.
    Put,
    /// HTTP PATCH - Partially update a resource.
    Patch,
    /// HTTP DELETE - Remove a resource.
    Delete,
}

impl RestMethod {
    /// Returns `true` if the endpoint verb for this method accepts a data
    /// argument.
    ///
    /// DELETE takes data as well, matching the endpoint surface where only
    /// GET and HEAD are data-less.
    pub fn carries_data(&self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }

    /// Returns the lowercase method name used in response envelopes.
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Head => "head",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}
