use crate::base::neterror::NetError;
use crate::cookies::jar::CookieJar;
use crate::http::response::HttpResponse;
use crate::http::streamfactory::{HttpStream, HttpStreamFactory};
use bytes::Bytes;
use http::header::{HeaderValue, COOKIE, HOST, SET_COOKIE};
use http::{HeaderMap, Method, Request};
use http_body_util::Full;
use std::sync::Arc;
use time::OffsetDateTime;
use url::{Position, Url};

/// Internal state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CreateStream,
    SendRequest,
    Done,
}

/// A single request/response exchange with one origin, no redirects.
///
/// Attaches the jar's cookies for the target host before sending and stores
/// the response's `Set-Cookie` values under that host afterwards.
pub struct HttpNetworkTransaction {
    factory: Arc<HttpStreamFactory>,
    cookie_jar: Arc<CookieJar>,
    url: Url,
    method: Method,
    request_headers: HeaderMap,
    body: Option<Bytes>,
    state: State,
    stream: Option<HttpStream>,
    response: Option<HttpResponse>,
}

impl HttpNetworkTransaction {
    pub fn new(factory: Arc<HttpStreamFactory>, url: Url, cookie_jar: Arc<CookieJar>) -> Self {
        Self {
            factory,
            cookie_jar,
            url,
            method: Method::GET,
            request_headers: HeaderMap::new(),
            body: None,
            state: State::Idle,
            stream: None,
            response: None,
        }
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn set_headers(&mut self, headers: HeaderMap) {
        self.request_headers = headers;
    }

    pub fn set_body(&mut self, body: Option<Bytes>) {
        self.body = body;
    }

    pub async fn start(&mut self) -> Result<(), NetError> {
        self.state = State::CreateStream;
        self.do_loop().await
    }

    async fn do_loop(&mut self) -> Result<(), NetError> {
        loop {
            match self.state {
                State::Idle | State::Done => return Ok(()),
                State::CreateStream => {
                    self.stream = Some(self.factory.create_stream(&self.url).await?);
                    self.state = State::SendRequest;
                }
                State::SendRequest => {
                    let req = self.build_request()?;
                    let stream = self.stream.as_mut().ok_or(NetError::ConnectionClosed)?;
                    let resp = stream.send_request(req).await?;

                    let host = self.url.host_str().unwrap_or_default();
                    let set_cookies = resp
                        .headers()
                        .get_all(SET_COOKIE)
                        .iter()
                        .filter_map(|v| v.to_str().ok());
                    let stored = self.cookie_jar.record_response(host, set_cookies);
                    if stored > 0 {
                        tracing::debug!("Stored {} cookie(s) for {}", stored, host);
                    }

                    self.response = Some(HttpResponse::from_hyper(resp));
                    self.stream = None;
                    self.state = State::Done;
                }
            }
        }
    }

    fn build_request(&self) -> Result<Request<Full<Bytes>>, NetError> {
        let host = self.url.host_str().ok_or(NetError::InvalidUrl)?;
        let mut headers = self.request_headers.clone();

        let host_value = match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        headers.insert(
            HOST,
            HeaderValue::from_str(&host_value).map_err(|_| NetError::InvalidUrl)?,
        );

        // Jar cookies replace whatever the caller sent.
        let cookie_value =
            self.cookie_jar
                .cookie_header_for(host, self.url.path(), OffsetDateTime::now_utc());
        if !cookie_value.is_empty() {
            let value = HeaderValue::from_str(&cookie_value).map_err(|_| NetError::InvalidHeader)?;
            headers.insert(COOKIE, value);
        }

        let target = &self.url[Position::BeforePath..Position::AfterQuery];
        let mut req = Request::builder()
            .method(self.method.clone())
            .uri(target)
            .body(Full::new(self.body.clone().unwrap_or_default()))
            .map_err(|_| NetError::InvalidUrl)?;
        *req.headers_mut() = headers;
        Ok(req)
    }

    /// Take ownership of the response.
    /// Can only be called once - subsequent calls return None.
    pub fn take_response(&mut self) -> Option<HttpResponse> {
        self.response.take()
    }
}
