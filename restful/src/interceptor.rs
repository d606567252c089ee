//! Request, response and error interceptors.
//!
//! Interceptors are registered on endpoints and inherited by their
//! descendants (override-or-inherit: a node that registers its own
//! interceptors of one kind stops seeing its ancestors' of that kind). The
//! engine only snapshots them into each request; backend adapters run them:
//!
//! - request interceptors rewrite the resolved [`RequestParts`] before
//!   encoding, in registration order;
//! - response interceptors rewrite a successful [`ResponseEnvelope`];
//! - error interceptors rewrite every failure, transport or status.
//!
//! Each interceptor carries a label so that serialized configurations stay
//! JSON-safe.

use std::fmt;
use std::sync::Arc;

use crate::config::RequestParts;
use crate::error::RequestError;
use crate::response::ResponseEnvelope;

macro_rules! interceptor {
    (
        $(#[$attr:meta])*
        $name:ident($input:ty)
    ) => {
        $(#[$attr])*
        #[derive(Clone)]
        pub struct $name {
            label: Arc<str>,
            apply: Arc<dyn Fn($input) -> $input + Send + Sync>,
        }

        impl $name {
            /// Creates an interceptor with a label used in serialized configurations.
            pub fn new<F>(label: impl Into<String>, apply: F) -> Self
            where
                F: Fn($input) -> $input + Send + Sync + 'static,
            {
                Self {
                    label: Arc::from(label.into()),
                    apply: Arc::new(apply),
                }
            }

            /// Returns the interceptor's label.
            pub fn label(&self) -> &str {
                &self.label
            }

            /// Runs the interceptor.
            pub fn apply(&self, input: $input) -> $input {
                (self.apply)(input)
            }
        }

        impl Labelled for $name {
            fn label(&self) -> &str {
                &self.label
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.label).finish()
            }
        }
    };
}

interceptor! {
    /// Rewrites an outgoing request after its URL has resolved.
    RequestInterceptor(RequestParts)
}

interceptor! {
    /// Rewrites a successful response envelope.
    ResponseInterceptor(ResponseEnvelope)
}

interceptor! {
    /// Rewrites a failed request's error.
    ErrorInterceptor(RequestError)
}

/// Runs `interceptors` over `input` in order.
pub(crate) fn run_request(interceptors: &[RequestInterceptor], input: RequestParts) -> RequestParts {
    interceptors.iter().fold(input, |acc, i| i.apply(acc))
}

pub(crate) fn run_response(
    interceptors: &[ResponseInterceptor],
    input: ResponseEnvelope,
) -> ResponseEnvelope {
    interceptors.iter().fold(input, |acc, i| i.apply(acc))
}

pub(crate) fn run_error(interceptors: &[ErrorInterceptor], input: RequestError) -> RequestError {
    interceptors.iter().fold(input, |acc, i| i.apply(acc))
}

/// Returns the labels of `interceptors`, in order.
pub(crate) fn labels<'a, I, T>(interceptors: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a T>,
    T: Labelled + 'a,
{
    interceptors
        .into_iter()
        .map(|i| i.label().to_string())
        .collect()
}

pub(crate) trait Labelled {
    fn label(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Headers;
    use crate::error::TransportError;
    use crate::method::RestMethod;

    fn parts() -> RequestParts {
        RequestParts {
            method: RestMethod::Get,
            url: "http://api/widgets".to_string(),
            headers: Headers::new(),
            params: None,
            data: None,
        }
    }

    #[test]
    fn test_request_interceptors_run_in_order() {
        let first = RequestInterceptor::new("first", |mut parts: RequestParts| {
            parts.headers.insert("X-Trace".to_string(), "a".to_string());
            parts
        });
        let second = RequestInterceptor::new("second", |mut parts: RequestParts| {
            let trace = parts.headers.get("X-Trace").cloned().unwrap_or_default();
            parts.headers.insert("X-Trace".to_string(), format!("{trace}b"));
            parts
        });

        let out = run_request(&[first, second], parts());
        assert_eq!(out.headers.get("X-Trace").map(String::as_str), Some("ab"));
    }

    #[test]
    fn test_error_interceptor_can_replace_error() {
        let wrap = ErrorInterceptor::new("wrap", |_| {
            RequestError::from(TransportError::Connection("rewritten".to_string()))
        });
        let out = run_error(&[wrap], TransportError::CallbackDropped.into());
        assert_eq!(out.to_string(), "Connection failed: rewritten");
    }

    #[test]
    fn test_labels_and_debug() {
        let interceptors = vec![
            ResponseInterceptor::new("unwrap", |e| e),
            ResponseInterceptor::new("audit", |e| e),
        ];
        assert_eq!(labels(&interceptors), vec!["unwrap", "audit"]);
        assert_eq!(format!("{:?}", interceptors[0]), "ResponseInterceptor(\"unwrap\")");
    }
}
