//! WebSocket frame types seen by the registry.

use bytes::Bytes;

/// A data or control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Text message (UTF-8)
    Text(String),
    Binary(Bytes),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Close frame with optional code and reason
    Close(Option<CloseFrame>),
}

/// Close frame data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: CloseCode,
    pub reason: String,
}

impl CloseFrame {
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Caller-initiated close.
    pub fn normal() -> Self {
        Self::new(CloseCode::NORMAL, "")
    }

    /// Reported when the transport went away without a close handshake.
    pub fn abnormal() -> Self {
        Self::new(CloseCode::ABNORMAL, "")
    }
}

/// WebSocket close codes (RFC 6455).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCode(pub u16);

impl CloseCode {
    pub const NORMAL: Self = Self(1000);
    /// Peer sent a close frame without a status code
    pub const NO_STATUS: Self = Self(1005);
    /// Never sent on the wire; no close frame was received
    pub const ABNORMAL: Self = Self(1006);
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl Message {
    /// Payload of a frame that gets relayed to the caller, with its
    /// binary flag. Text is relayed as its UTF-8 bytes. Control frames
    /// are not relayed.
    pub fn relayed_payload(&self) -> Option<(&[u8], bool)> {
        match self {
            Message::Text(s) => Some((s.as_bytes(), false)),
            Message::Binary(b) => Some((b, true)),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
        }
    }
}
