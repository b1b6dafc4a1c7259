use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {reason}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved for {domain}: {reason}")]
    NameNotResolvedFor { domain: String, reason: String },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("WebSocket protocol error")]
    WsProtocolError,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Invalid redirect")]
    InvalidRedirect,
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Method not supported")]
    MethodNotSupported,
    #[error("Empty response")]
    EmptyResponse,

    // Bridge errors (custom codes starting at -900)
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Failed to read response body")]
    HttpBodyError,
    #[error("Request timed out after {timeout_ms} ms")]
    RequestTimedOut { timeout_ms: u64 },
    #[error("Socket id already in use: {0}")]
    SocketIdInUse(String),
    #[error("No socket registered for id: {0}")]
    SocketNotFound(String),
    #[error("Socket is not open: {0}")]
    SocketNotOpen(String),
    #[error("Payload is not valid base64")]
    InvalidPayload,
    #[error("No Tokio runtime available")]
    NoRuntime,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed | NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved | NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::ConnectionTimedOut => -118,
            NetError::WsProtocolError => -145,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::InvalidRedirect => -303,
            NetError::TooManyRedirects => -310,
            NetError::InvalidResponse => -320,
            NetError::MethodNotSupported => -322,
            NetError::EmptyResponse => -324,

            NetError::InvalidHeader => -900,
            NetError::HttpBodyError => -901,
            NetError::RequestTimedOut { .. } => -902,
            NetError::SocketIdInUse(_) => -903,
            NetError::SocketNotFound(_) => -904,
            NetError::SocketNotOpen(_) => -905,
            NetError::InvalidPayload => -906,
            NetError::NoRuntime => -907,
            NetError::Unknown(code) => *code,
        }
    }

    /// Errors the caller caused, as opposed to the network or the remote peer.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            NetError::InvalidUrl
                | NetError::DisallowedUrlScheme
                | NetError::MethodNotSupported
                | NetError::InvalidHeader
                | NetError::SocketIdInUse(_)
                | NetError::SocketNotFound(_)
                | NetError::SocketNotOpen(_)
                | NetError::InvalidPayload
        )
    }

    pub fn connection_failed_to(host: &str, port: u16, err: std::io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            reason: err.to_string(),
        }
    }

    pub fn dns_failed(domain: &str, err: std::io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Decodes a code back into its variant. Variants that carry data come back
/// with empty placeholders, since the code alone does not hold the details.
impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -118 => NetError::ConnectionTimedOut,
            -145 => NetError::WsProtocolError,

            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -303 => NetError::InvalidRedirect,
            -310 => NetError::TooManyRedirects,
            -320 => NetError::InvalidResponse,
            -322 => NetError::MethodNotSupported,
            -324 => NetError::EmptyResponse,

            -900 => NetError::InvalidHeader,
            -901 => NetError::HttpBodyError,
            -902 => NetError::RequestTimedOut { timeout_ms: 0 },
            -903 => NetError::SocketIdInUse(String::new()),
            -904 => NetError::SocketNotFound(String::new()),
            -905 => NetError::SocketNotOpen(String::new()),
            -906 => NetError::InvalidPayload,
            -907 => NetError::NoRuntime,
            _ => NetError::Unknown(code),
        }
    }
}
