//! Response body parsing.

use serde_json::Value;
use tracing::warn;

use crate::method::RestMethod;

const NO_CONTENT: u16 = 204;

/// Parses a response body.
///
/// An empty body is `None`. Anything else is parsed as JSON, falling back to
/// the raw text as a JSON string when it is not valid JSON. Empty bodies are
/// expected for `204` and for `HEAD`.
pub fn parse_body(method: RestMethod, status: u16, body: Option<&str>) -> Option<Value> {
    let text = match body {
        Some(text) if !text.is_empty() => text,
        _ => {
            if status != NO_CONTENT && method != RestMethod::Head {
                warn!(status, "response has an empty body");
            }
            return None;
        }
    };

    if status == NO_CONTENT {
        warn!(len = text.len(), "204 No Content response carried a body");
    }

    Some(
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
    )
}
