//! Request and result shapes exchanged with the host.

use crate::base::encoding;
use crate::base::neterror::NetError;
use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A caller's description of one HTTP call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    /// Strings are sent verbatim; any other JSON value is serialized.
    pub body: Option<serde_json::Value>,
}

impl ProxyRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Raw bytes to put on the wire, and whether they came from a JSON value.
    pub(crate) fn body_bytes(&self) -> Option<(Bytes, bool)> {
        match self.body.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((Bytes::from(s.clone()), false)),
            other => Some((Bytes::from(other.to_string()), true)),
        }
    }
}

/// Outcome of one proxied HTTP call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResult {
    pub success: bool,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub content_type: String,
    /// Base64 of the raw response body.
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResult {
    pub(crate) fn completed(
        status: http::StatusCode,
        headers: &HeaderMap,
        body: &[u8],
        default_content_type: &str,
    ) -> Self {
        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(default_content_type)
            .to_string();

        Self {
            success: true,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: flatten_headers(headers),
            content_type,
            data: encoding::encode(body),
            error: None,
        }
    }

    /// A failed call. `partial` carries the response head when one arrived
    /// before the failure.
    pub(crate) fn failed(
        err: &NetError,
        partial: Option<(http::StatusCode, &HeaderMap)>,
        default_content_type: &str,
    ) -> Self {
        let (status, headers) = match partial {
            Some((status, headers)) => (status, flatten_headers(headers)),
            None if err.is_validation_error() => (http::StatusCode::BAD_REQUEST, BTreeMap::new()),
            None => (http::StatusCode::INTERNAL_SERVER_ERROR, BTreeMap::new()),
        };

        Self {
            success: false,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            content_type: default_content_type.to_string(),
            data: String::new(),
            error: Some(err.to_string()),
        }
    }

    /// Decode `data` back to the raw body.
    pub fn body_bytes(&self) -> Result<Vec<u8>, NetError> {
        encoding::decode(&self.data)
    }
}

/// Lowercased header names; repeated headers are joined with `", "`.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, StatusCode};

    #[test]
    fn test_completed_defaults_content_type() {
        let result = ProxyResult::completed(StatusCode::OK, &HeaderMap::new(), b"\x00\xff", "application/octet-stream");
        assert!(result.success);
        assert_eq!(result.status, 200);
        assert_eq!(result.status_text, "OK");
        assert_eq!(result.content_type, "application/octet-stream");
        assert_eq!(result.body_bytes().unwrap(), b"\x00\xff");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_repeated_headers_joined() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let result = ProxyResult::completed(StatusCode::NOT_FOUND, &headers, b"", "x/y");
        assert_eq!(result.headers["set-cookie"], "a=1, b=2");
        assert_eq!(result.content_type, "text/plain");
        assert_eq!(result.status, 404);
    }

    #[test]
    fn test_failed_status_selection() {
        let local = ProxyResult::failed(&NetError::InvalidUrl, None, "x/y");
        assert_eq!(local.status, 400);
        assert!(!local.success);
        assert_eq!(local.error.as_deref(), Some("Invalid URL"));
        assert!(local.data.is_empty());

        let network = ProxyResult::failed(&NetError::ConnectionRefused, None, "x/y");
        assert_eq!(network.status, 500);

        let headers = HeaderMap::new();
        let partial = ProxyResult::failed(&NetError::HttpBodyError, Some((StatusCode::BAD_GATEWAY, &headers)), "x/y");
        assert_eq!(partial.status, 502);
    }

    #[test]
    fn test_serialized_shape() {
        let result = ProxyResult::completed(StatusCode::OK, &HeaderMap::new(), b"hi", "text/plain");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["statusText"], "OK");
        assert_eq!(json["contentType"], "text/plain");
        assert_eq!(json["data"], "aGk=");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_request_deserialize() {
        let req: ProxyRequest = serde_json::from_str(
            r#"{ "url": "https://example.com", "headers": { "X-A": "1" }, "body": { "k": 1 } }"#,
        )
        .unwrap();
        assert_eq!(req.method, "");
        assert_eq!(req.headers["X-A"], "1");
        let (bytes, is_json) = req.body_bytes().unwrap();
        assert_eq!(&bytes[..], br#"{"k":1}"#);
        assert!(is_json);
    }

    #[test]
    fn test_string_body_is_verbatim() {
        let req = ProxyRequest::post("http://x.test").body("a=1&b=2");
        let (bytes, is_json) = req.body_bytes().unwrap();
        assert_eq!(&bytes[..], b"a=1&b=2");
        assert!(!is_json);
    }
}
