//! The canonical response shape produced by every backend.

use serde::Serialize;
use serde_json::Value;

use super::format::parse_body;
use crate::config::Headers;
use crate::method::RestMethod;

/// A transport response normalized into one shape.
///
/// `method` is the lowercase verb name, `data` the parsed body (`None` for an
/// empty body).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub data: Option<Value>,
    pub headers: Headers,
    pub method: String,
    pub status_code: u16,
}

impl ResponseEnvelope {
    /// Returns `true` for statuses in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// What a transport reported, before body parsing.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RawResponse {
    /// Parses the body and builds the envelope. Returns the status text
    /// alongside it for error messages.
    pub fn into_envelope(self, method: RestMethod) -> (String, ResponseEnvelope) {
        let data = parse_body(method, self.status, self.body.as_deref());
        let envelope = ResponseEnvelope {
            data,
            headers: self.headers,
            method: method.as_lowercase().to_string(),
            status_code: self.status,
        };
        (self.status_text, envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_serializes_camel_case() {
        let envelope = ResponseEnvelope {
            data: None,
            headers: Headers::new(),
            method: "head".to_string(),
            status_code: 204,
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "data": null, "headers": {}, "method": "head", "statusCode": 204 })
        );
    }

    #[test]
    fn test_success_range() {
        let mut envelope = ResponseEnvelope {
            data: None,
            headers: Headers::new(),
            method: "get".to_string(),
            status_code: 200,
        };
        assert!(envelope.is_success());
        envelope.status_code = 299;
        assert!(envelope.is_success());
        envelope.status_code = 300;
        assert!(!envelope.is_success());
        envelope.status_code = 199;
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_into_envelope() {
        let raw = RawResponse {
            status: 404,
            status_text: "Not Found".to_string(),
            headers: Headers::from([("test".to_string(), "here".to_string())]),
            body: Some(r#"{"content":"Yes"}"#.to_string()),
        };
        let (message, envelope) = raw.into_envelope(RestMethod::Get);
        assert_eq!(message, "Not Found");
        assert_eq!(envelope.method, "get");
        assert_eq!(envelope.data, Some(json!({ "content": "Yes" })));
        assert!(!envelope.is_success());
    }
}
