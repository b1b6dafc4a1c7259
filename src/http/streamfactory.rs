use crate::base::neterror::NetError;
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::spawn;
use url::Url;

/// One HTTP/1.1 connection ready to carry a single exchange.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
}

impl HttpStream {
    pub async fn send_request(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        self.sender.send_request(req).await.map_err(|e| {
            tracing::debug!("Request error: {:?}", e);
            if e.is_incomplete_message() {
                NetError::EmptyResponse
            } else if e.is_parse() {
                NetError::InvalidResponse
            } else {
                NetError::ConnectionClosed
            }
        })
    }
}

/// Opens a fresh connection per hop; the bridge keeps no pool.
pub struct HttpStreamFactory {
    tls: TlsConfig,
}

impl Default for HttpStreamFactory {
    fn default() -> Self {
        Self::new(TlsConfig::default())
    }
}

impl HttpStreamFactory {
    pub fn new(tls: TlsConfig) -> Self {
        Self { tls }
    }

    pub async fn create_stream(&self, url: &Url) -> Result<HttpStream, NetError> {
        // 1. Get raw socket
        let socket = ConnectJob::connect(url, &self.tls).await?;
        if socket.is_tls() {
            tracing::debug!(
                "TLS established with {:?}, ALPN {:?}",
                url.host_str(),
                socket.alpn_protocol().map(String::from_utf8_lossy)
            );
        }

        // 2. Handshake
        let io = TokioIo::new(socket);
        let (sender, conn) = http1::handshake(io).await.map_err(|e| {
            tracing::debug!("HTTP/1.1 handshake failed: {:?}", e);
            NetError::ConnectionFailed
        })?;

        // 3. Spawn the connection driver
        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("Connection driver ended: {:?}", e);
            }
        });

        Ok(HttpStream { sender })
    }
}
