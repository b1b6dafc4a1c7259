use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::socket::client::SocketType;
use crate::socket::tls::TlsConfig;
use tokio::net::TcpStream;
use url::Url;

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(url: &Url, tls: &TlsConfig) -> Result<SocketType, NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;

        // 1. DNS Resolution
        let addrs: Vec<_> = tokio::net::lookup_host((host.trim_matches(|c| c == '[' || c == ']'), port))
            .await
            .dns_context(host)?
            .collect();
        if addrs.is_empty() {
            return Err(NetError::NameNotResolved);
        }

        // 2. TCP Connect, first address that answers wins
        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => {
                return Err::<SocketType, std::io::Error>(e).connection_context(host, port)
            }
            (None, None) => return Err(NetError::ConnectionFailed),
        };
        let _ = stream.set_nodelay(true);

        // 3. SSL Handshake (if https)
        if url.scheme() != "https" {
            return Ok(SocketType::Tcp(stream));
        }

        let server_name = host.trim_matches(|c| c == '[' || c == ']');
        let connector = tls.connector()?;
        let mut config = connector.configure().map_err(|_| NetError::SslProtocolError)?;
        if !TlsConfig::should_set_sni(server_name) {
            config.set_use_server_name_indication(false);
        }

        let tls_stream = tokio_boring::connect(config, server_name, stream).await.map_err(|e| {
            tracing::debug!("SSL handshake with {} failed: {:?}", server_name, e);
            NetError::SslProtocolError
        })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}
