//! HTTP Response with body access.

use crate::base::neterror::NetError;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;

/// HTTP response whose body has not been read yet.
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Incoming,
}

impl HttpResponse {
    /// Create from hyper Response<Incoming>.
    pub fn from_hyper(resp: http::Response<Incoming>) -> Self {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Location` target when this is a followable redirect.
    pub fn redirect_location(&self) -> Option<&str> {
        match self.status.as_u16() {
            301 | 302 | 303 | 307 | 308 => {
                self.headers.get(http::header::LOCATION)?.to_str().ok()
            }
            _ => None,
        }
    }

    /// Read the whole body as raw bytes, whatever its content type.
    pub async fn bytes(self) -> Result<Bytes, NetError> {
        let collected = self.body.collect().await.map_err(|e| {
            tracing::debug!("Body read failed: {:?}", e);
            NetError::HttpBodyError
        })?;
        Ok(collected.to_bytes())
    }
}
