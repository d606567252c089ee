//! Query string and request body encoding.
//!
//! Nested parameters use bracket notation: arrays of scalars become
//! `key[]=a&key[]=b`, objects become `key[inner]=v`, arrays of objects are
//! indexed (`key[0][inner]=v`). `null` encodes as an empty value. Keys are
//! emitted in sorted order.

use serde_json::Value;
use url::form_urlencoded;

use crate::config::Params;
use crate::error::RequestError;

/// Body encoding selected from a `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Form,
    Other,
}

impl ContentKind {
    pub fn detect(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Other;
        };
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("application/json") {
            Self::Json
        } else if content_type.contains("application/x-www-form-urlencoded") {
            Self::Form
        } else {
            Self::Other
        }
    }
}

/// An encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Text ready to send.
    Text(String),
    /// Data handed to the transport unchanged.
    Value(Value),
}

impl RequestBody {
    /// Returns the body as text, serializing structured values as JSON.
    pub fn into_text(self) -> Result<String, RequestError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Value(value) => Ok(serde_json::to_string(&value)?),
        }
    }
}

/// Encodes `data` for a transport that sends raw bodies.
///
/// JSON content is stringified, form content is bracket-encoded, and anything
/// else passes through (strings as text).
pub(crate) fn encode_body(kind: ContentKind, data: Value) -> Result<RequestBody, RequestError> {
    match (kind, data) {
        (ContentKind::Json, data) => Ok(RequestBody::Text(serde_json::to_string(&data)?)),
        (ContentKind::Form, data) => Ok(RequestBody::Text(encode_form(&data))),
        (ContentKind::Other, Value::String(text)) => Ok(RequestBody::Text(text)),
        (ContentKind::Other, data) => Ok(RequestBody::Value(data)),
    }
}

/// Encodes query parameters. Returns an empty string when there is nothing
/// to encode.
pub fn encode_query(params: &Params) -> String {
    let mut pairs = Vec::new();
    for (key, value) in sorted(params) {
        flatten(key.clone(), value, &mut pairs);
    }
    serialize_pairs(&pairs)
}

/// Encodes a form body. Objects use the query notation; strings are sent as
/// they are.
pub fn encode_form(data: &Value) -> String {
    match data {
        Value::Object(map) => encode_query(map),
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Appends `params` to `url` when they encode to something.
pub(crate) fn append_query(url: String, params: Option<&Params>) -> String {
    let Some(query) = params.map(encode_query).filter(|q| !q.is_empty()) else {
        return url;
    };
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn flatten(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => out.push((prefix, String::new())),
        Value::Bool(b) => out.push((prefix, b.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let key = if item.is_object() || item.is_array() {
                    format!("{prefix}[{index}]")
                } else {
                    format!("{prefix}[]")
                };
                flatten(key, item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in sorted(map) {
                flatten(format!("{prefix}[{key}]"), item, out);
            }
        }
    }
}

fn sorted(map: &Params) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn serialize_pairs(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
