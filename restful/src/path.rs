//! Path segments and lazily resolved URLs.
//!
//! A scope's path is an ordered list of [`PathSegment`]s. Segments are either
//! known strings or futures that will produce a string later (for example a
//! base URL read from remote configuration). Joining never blocks: the result
//! is a [`ResolvedUrl`], a cloneable future that resolves every segment
//! concurrently and joins them in order.

use std::fmt;
use std::future::{Future, IntoFuture};

use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;

/// Separator placed between path segments.
pub const PATH_SEPARATOR: char = '/';

const SEPARATOR: &str = "/";

type SharedString = Shared<BoxFuture<'static, String>>;

/// One element of a scope path.
#[derive(Clone)]
pub enum PathSegment {
    /// A segment whose value is already known.
    Ready(String),
    /// A segment that is produced asynchronously.
    Pending(SharedString),
}

impl PathSegment {
    /// Creates a ready segment, trimming path separators from both ends.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self::Ready(trim(value.as_ref()).to_string())
    }

    /// Creates a segment from a future value.
    ///
    /// The value is trimmed of path separators once it resolves.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = String> + Send + 'static,
    {
        Self::Pending(
            future
                .map(|value| trim(&value).to_string())
                .boxed()
                .shared(),
        )
    }

    /// Returns the segment value if it is already known.
    pub fn as_ready(&self) -> Option<&str> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// Resolves the segment to its string value.
    pub async fn resolve(self) -> String {
        match self {
            Self::Ready(value) => value,
            Self::Pending(future) => future.await,
        }
    }
}

impl fmt::Debug for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(future) => match future.peek() {
                Some(value) => f.debug_tuple("Pending").field(value).finish(),
                None => f.write_str("Pending(..)"),
            },
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&String> for PathSegment {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

macro_rules! segment_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PathSegment {
                fn from(value: $ty) -> Self {
                    Self::Ready(value.to_string())
                }
            }
        )*
    };
}

segment_from_integer!(u32, u64, i32, i64, usize);

fn trim(value: &str) -> &str {
    value.trim_matches(PATH_SEPARATOR)
}

/// The segments added by a fork.
///
/// Strings are trimmed of leading and trailing separators and then split on
/// the separator, so `"/users/42/"` contributes `users` and `42`, and
/// `"http://host/items"` still joins back to the same URL.
#[derive(Debug, Clone, Default)]
pub struct ForkPath(Vec<PathSegment>);

impl ForkPath {
    /// Returns the segments in order.
    pub fn into_segments(self) -> Vec<PathSegment> {
        self.0
    }
}

impl From<&str> for ForkPath {
    fn from(value: &str) -> Self {
        let value = trim(value);
        if value.is_empty() {
            return Self::default();
        }
        Self(
            value
                .split(PATH_SEPARATOR)
                .map(|piece| PathSegment::Ready(piece.to_string()))
                .collect(),
        )
    }
}

impl From<String> for ForkPath {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&String> for ForkPath {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<PathSegment> for ForkPath {
    fn from(segment: PathSegment) -> Self {
        Self(vec![segment])
    }
}

impl From<Vec<PathSegment>> for ForkPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[PathSegment; N]> for ForkPath {
    fn from(segments: [PathSegment; N]) -> Self {
        Self(segments.into())
    }
}

/// A URL that becomes known once every path segment has resolved.
///
/// Cloning is cheap and every clone resolves to the same value. Await it
/// directly (`url.await`) or through [`ResolvedUrl::resolve`].
#[derive(Clone)]
pub struct ResolvedUrl(SharedString);

impl ResolvedUrl {
    /// Joins `segments` with the path separator once they have all resolved.
    pub fn join(segments: Vec<PathSegment>) -> Self {
        let joined = async move {
            join_all(segments.into_iter().map(PathSegment::resolve))
                .await
                .join(SEPARATOR)
        };
        Self(joined.boxed().shared())
    }

    /// Waits for the URL.
    pub async fn resolve(&self) -> String {
        self.0.clone().await
    }

    /// Returns the URL if it has already been resolved by some clone.
    pub fn peek(&self) -> Option<&str> {
        self.0.peek().map(String::as_str)
    }
}

impl IntoFuture for ResolvedUrl {
    type Output = String;
    type IntoFuture = SharedString;

    fn into_future(self) -> Self::IntoFuture {
        self.0
    }
}

impl fmt::Debug for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(url) => f.debug_tuple("ResolvedUrl").field(&url).finish(),
            None => f.write_str("ResolvedUrl(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn test_new_trims_separators() {
        assert_eq!(PathSegment::new("/users/").as_ready(), Some("users"));
        assert_eq!(
            PathSegment::new("http://api/").as_ready(),
            Some("http://api")
        );
    }

    #[test]
    fn test_fork_path_splits_strings() {
        let segments = ForkPath::from("/users/42/").into_segments();
        let values: Vec<_> = segments.iter().filter_map(|s| s.as_ready()).collect();
        assert_eq!(values, vec!["users", "42"]);
    }

    #[tokio::test]
    async fn test_fork_path_keeps_absolute_urls() {
        let segments = ForkPath::from("http://other/items").into_segments();
        assert_eq!(segments.len(), 4);
        assert_eq!(ResolvedUrl::join(segments).await, "http://other/items");
        assert!(ForkPath::from("/").into_segments().is_empty());
    }

    #[test]
    fn test_integer_segments() {
        assert_eq!(PathSegment::from(7u64).as_ready(), Some("7"));
    }

    #[tokio::test]
    async fn test_join_ready_segments() {
        let url = ResolvedUrl::join(vec!["root".into(), "a".into(), "b".into()]);
        assert_eq!(url.await, "root/a/b");
    }

    #[tokio::test]
    async fn test_join_preserves_order_with_pending_segments() {
        let (tx, rx) = oneshot::channel::<String>();
        let base = PathSegment::pending(async move { rx.await.unwrap_or_default() });
        let url = ResolvedUrl::join(vec![base, "widgets".into()]);
        assert!(url.peek().is_none());

        tx.send("http://api/".to_string()).unwrap();
        assert_eq!(url.resolve().await, "http://api/widgets");
        assert_eq!(url.peek(), Some("http://api/widgets"));
    }

    #[tokio::test]
    async fn test_clones_share_the_result() {
        let url = ResolvedUrl::join(vec![PathSegment::pending(async { "x".to_string() })]);
        let other = url.clone();
        assert_eq!(url.resolve().await, "x");
        assert_eq!(other.peek(), Some("x"));
    }
}
