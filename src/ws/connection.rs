//! WebSocket connection with tokio-tungstenite.
//!
//! The sink and stream halves sit behind separate mutexes so one task can
//! block in [`WebSocket::recv`] while others call [`WebSocket::send`].

use super::message::{CloseCode, CloseFrame, Message};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An established WebSocket client connection.
pub struct WebSocket {
    sink: Mutex<SplitSink<WsStream, tungstenite::Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    url: Url,
}

impl WebSocket {
    /// Check that `url` is something [`WebSocket::connect`] can dial.
    pub fn validate_url(url: &str) -> Result<Url, NetError> {
        let url = Url::parse(url.trim()).map_err(|_| NetError::InvalidUrl)?;
        if url.scheme() != "ws" && url.scheme() != "wss" {
            return Err(NetError::DisallowedUrlScheme);
        }
        if url.host_str().is_none() {
            return Err(NetError::InvalidUrl);
        }
        Ok(url)
    }

    /// Perform the opening handshake.
    pub async fn connect(url: &Url) -> Result<Self, NetError> {
        let (ws_stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| handshake_error(url, e))?;
        tracing::debug!("WebSocket handshake with {} -> {}", url, response.status());

        let (sink, stream) = ws_stream.split();

        Ok(Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            url: url.clone(),
        })
    }

    pub async fn send(&self, msg: Message) -> Result<(), NetError> {
        let mut sink = self.sink.lock().await;
        sink.send(message_to_tungstenite(msg)).await.map_err(|e| {
            tracing::debug!("WebSocket send error on {}: {:?}", self.url, e);
            NetError::ConnectionClosed
        })
    }

    /// Send a close frame. The peer's reply still arrives through `recv`.
    pub async fn close(&self, frame: CloseFrame) -> Result<(), NetError> {
        self.send(Message::Close(Some(frame))).await
    }

    /// Next frame from the peer.
    ///
    /// Returns `None` once the stream has ended.
    pub async fn recv(&self) -> Result<Option<Message>, NetError> {
        let mut stream = self.stream.lock().await;
        match stream.next().await {
            Some(Ok(msg)) => Ok(tungstenite_to_message(msg)),
            Some(Err(e)) => {
                tracing::debug!("WebSocket recv error on {}: {:?}", self.url, e);
                Err(frame_error(e))
            }
            None => Ok(None),
        }
    }
}

fn handshake_error(url: &Url, e: tungstenite::Error) -> NetError {
    tracing::debug!("WebSocket connect error for {}: {:?}", url, e);
    match e {
        tungstenite::Error::Io(io) => {
            let host = url.host_str().unwrap_or_default();
            let port = url.port_or_known_default().unwrap_or_default();
            Err::<(), std::io::Error>(io)
                .connection_context(host, port)
                .err()
                .unwrap_or(NetError::ConnectionFailed)
        }
        tungstenite::Error::Url(_) => NetError::InvalidUrl,
        tungstenite::Error::Tls(_) => NetError::SslProtocolError,
        tungstenite::Error::Http(_)
        | tungstenite::Error::HttpFormat(_)
        | tungstenite::Error::Protocol(_) => NetError::WsProtocolError,
        _ => NetError::ConnectionFailed,
    }
}

fn frame_error(e: tungstenite::Error) -> NetError {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            NetError::ConnectionClosed
        }
        tungstenite::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionReset => {
            NetError::ConnectionReset
        }
        tungstenite::Error::Io(_) => NetError::ConnectionAborted,
        _ => NetError::WsProtocolError,
    }
}

fn message_to_tungstenite(msg: Message) -> tungstenite::Message {
    match msg {
        Message::Text(s) => tungstenite::Message::Text(s),
        Message::Binary(b) => tungstenite::Message::Binary(b.to_vec()),
        Message::Ping(d) => tungstenite::Message::Ping(d),
        Message::Pong(d) => tungstenite::Message::Pong(d),
        Message::Close(frame) => {
            let tung_frame = frame.map(|f| tungstenite::protocol::CloseFrame {
                code: tungstenite::protocol::frame::coding::CloseCode::from(f.code.0),
                reason: f.reason.into(),
            });
            tungstenite::Message::Close(tung_frame)
        }
    }
}

/// Raw frames never surface from a client stream; they map to `None`.
fn tungstenite_to_message(msg: tungstenite::Message) -> Option<Message> {
    let msg = match msg {
        tungstenite::Message::Text(s) => Message::Text(s.to_string()),
        tungstenite::Message::Binary(b) => Message::Binary(b.into()),
        tungstenite::Message::Ping(d) => Message::Ping(d.to_vec()),
        tungstenite::Message::Pong(d) => Message::Pong(d.to_vec()),
        tungstenite::Message::Close(frame) => Message::Close(frame.map(|f| CloseFrame {
            code: CloseCode(f.code.into()),
            reason: f.reason.to_string(),
        })),
        tungstenite::Message::Frame(_) => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_validate_url() {
        assert!(WebSocket::validate_url("ws://example.com/ws").is_ok());
        assert!(WebSocket::validate_url("wss://example.com").is_ok());
        assert_eq!(
            WebSocket::validate_url("http://example.com").unwrap_err(),
            NetError::DisallowedUrlScheme
        );
        assert_eq!(WebSocket::validate_url("").unwrap_err(), NetError::InvalidUrl);
        assert_eq!(WebSocket::validate_url("::nope").unwrap_err(), NetError::InvalidUrl);
    }

    #[test]
    fn test_message_conversion() {
        let tung = message_to_tungstenite(Message::Binary(Bytes::from_static(&[0, 1, 255])));
        assert_eq!(
            tungstenite_to_message(tung),
            Some(Message::Binary(Bytes::from_static(&[0, 1, 255])))
        );

        let tung = message_to_tungstenite(Message::Close(Some(CloseFrame::normal())));
        assert_eq!(
            tungstenite_to_message(tung),
            Some(Message::Close(Some(CloseFrame::new(CloseCode::NORMAL, ""))))
        );
    }

    #[test]
    fn test_frame_error_mapping() {
        assert_eq!(frame_error(tungstenite::Error::ConnectionClosed), NetError::ConnectionClosed);
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert_eq!(frame_error(tungstenite::Error::Io(reset)), NetError::ConnectionReset);
    }

    #[tokio::test]
    async fn test_connect_refused_names_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{}/", port)).unwrap();
        let err = WebSocket::connect(&url).await.err().unwrap();
        assert!(err.to_string().contains(&format!("127.0.0.1:{}", port)), "{}", err);
    }
}
