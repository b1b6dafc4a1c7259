//! Cookie-carrying HTTP forwarding.
//!
//! [`HttpProxy::request`] always resolves to a [`ProxyResult`]. Non-2xx
//! statuses are ordinary results; only local validation problems and
//! transport failures produce `success: false`.

use crate::base::context::TimeoutResultExt;
use crate::base::neterror::NetError;
use crate::config::BridgeConfig;
use crate::cookies::jar::CookieJar;
use crate::http::result::{ProxyRequest, ProxyResult};
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::transaction::HttpNetworkTransaction;
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::header::{
    HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HOST, ORIGIN, USER_AGENT,
};
use http::{HeaderMap, Method, StatusCode};
use std::sync::Arc;
use url::Url;

/// A validated request, ready for dispatch.
#[derive(Debug, Clone)]
struct PreparedRequest {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
}

pub struct HttpProxy {
    factory: Arc<HttpStreamFactory>,
    cookie_jar: Arc<CookieJar>,
    config: BridgeConfig,
}

impl HttpProxy {
    pub fn new(cookie_jar: Arc<CookieJar>, config: BridgeConfig) -> Self {
        Self::with_tls(cookie_jar, config, TlsConfig::default())
    }

    pub fn with_tls(cookie_jar: Arc<CookieJar>, config: BridgeConfig, tls: TlsConfig) -> Self {
        Self {
            factory: Arc::new(HttpStreamFactory::new(tls)),
            cookie_jar,
            config,
        }
    }

    pub fn cookie_jar(&self) -> &Arc<CookieJar> {
        &self.cookie_jar
    }

    /// Forward one HTTP call.
    pub async fn request(&self, req: ProxyRequest) -> ProxyResult {
        let default_content_type = self.config.default_content_type.as_str();

        let prepared = match self.prepare(&req) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("Rejected request to {:?}: {}", req.url, e);
                return ProxyResult::failed(&e, None, default_content_type);
            }
        };

        tracing::debug!("{} {}", prepared.method, prepared.url);

        let timeout = self.config.request_timeout;
        let mut partial: Option<(StatusCode, HeaderMap)> = None;
        let outcome = tokio::time::timeout(timeout, self.execute(prepared, &mut partial))
            .await
            .timeout_context(timeout)
            .and_then(|r| r);

        match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Request to {} failed: {}", req.url, e);
                let head = partial.as_ref().map(|(s, h)| (*s, h));
                ProxyResult::failed(&e, head, default_content_type)
            }
        }
    }

    fn prepare(&self, req: &ProxyRequest) -> Result<PreparedRequest, NetError> {
        let raw_url = req.url.trim();
        if raw_url.is_empty() {
            return Err(NetError::InvalidUrl);
        }
        let url = Url::parse(raw_url).map_err(|_| NetError::InvalidUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NetError::DisallowedUrlScheme);
        }
        if url.host_str().is_none() {
            return Err(NetError::InvalidUrl);
        }

        let method = match req.method.trim() {
            "" => Method::GET,
            m => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| NetError::MethodNotSupported)?,
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &req.headers {
            let name = match HeaderName::from_bytes(name.trim().as_bytes()) {
                Ok(n) => n,
                Err(_) => {
                    tracing::warn!("Dropping header with invalid name {:?}", name);
                    continue;
                }
            };
            // Forged across a proxy hop.
            if name == HOST || name == ORIGIN {
                continue;
            }
            match HeaderValue::from_str(value) {
                Ok(v) => {
                    headers.insert(name, v);
                }
                Err(_) => tracing::warn!("Dropping header {} with invalid value", name),
            }
        }

        if !headers.contains_key(USER_AGENT) {
            if let Some(ua) = self.config.user_agent.as_deref() {
                if let Ok(v) = HeaderValue::from_str(ua) {
                    headers.insert(USER_AGENT, v);
                }
            }
        }

        let body = if carries_body(&method) {
            req.body_bytes().map(|(bytes, is_json)| {
                if is_json && !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                bytes
            })
        } else {
            None
        };
        // Recomputed by hyper from the body actually sent.
        headers.remove(CONTENT_LENGTH);

        Ok(PreparedRequest { url, method, headers, body })
    }

    async fn execute(
        &self,
        prepared: PreparedRequest,
        partial: &mut Option<(StatusCode, HeaderMap)>,
    ) -> Result<ProxyResult, NetError> {
        let PreparedRequest { mut url, mut method, mut headers, mut body } = prepared;
        let mut redirects_left = self.config.max_redirects;

        loop {
            let mut transaction =
                HttpNetworkTransaction::new(self.factory.clone(), url.clone(), self.cookie_jar.clone());
            transaction.set_method(method.clone());
            transaction.set_headers(headers.clone());
            transaction.set_body(body.clone());
            transaction.start().await?;

            let response = transaction.take_response().ok_or(NetError::EmptyResponse)?;
            let status = response.status();

            if let Some(location) = response.redirect_location() {
                let next = url.join(location).map_err(|_| NetError::InvalidRedirect)?;
                if !matches!(next.scheme(), "http" | "https") {
                    return Err(NetError::InvalidRedirect);
                }
                if redirects_left == 0 {
                    return Err(NetError::TooManyRedirects);
                }
                redirects_left -= 1;

                if switches_to_get(status, &method) {
                    method = Method::GET;
                    body = None;
                    headers.remove(CONTENT_TYPE);
                }
                if next.origin() != url.origin() {
                    headers.remove(AUTHORIZATION);
                }

                tracing::debug!("{} redirect {} -> {}", status.as_u16(), url, next);
                url = next;
                continue;
            }

            *partial = Some((status, response.headers().clone()));
            let headers = response.headers().clone();
            let data = response.bytes().await?;

            tracing::debug!("{} {} -> {} ({} bytes)", method, url, status.as_u16(), data.len());
            return Ok(ProxyResult::completed(
                status,
                &headers,
                &data,
                &self.config.default_content_type,
            ));
        }
    }
}

/// Only POST, PUT and PATCH put the caller's body on the wire.
fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Browser behavior: 303 always becomes GET, 301/302 do for anything but
/// GET and HEAD.
fn switches_to_get(status: StatusCode, method: &Method) -> bool {
    match status.as_u16() {
        303 => *method != Method::HEAD,
        301 | 302 => *method != Method::GET && *method != Method::HEAD,
        _ => false,
    }
}
