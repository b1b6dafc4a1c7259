//! Extension traits that turn low-level failures into descriptive `NetError`s.
//!
//! The bridge reports errors to its caller as plain strings, so the variant
//! chosen here is what the caller ends up reading.

use crate::base::neterror::NetError;
use std::io;
use std::time::Duration;
use tokio::time::error::Elapsed;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Attach the target endpoint to a TCP connect failure.
    ///
    /// ```ignore
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("example.com", 443)?;
    /// // Error: "Connection to example.com:443 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Attach the looked-up name to a resolver failure.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::ConnectionRefused => NetError::ConnectionFailedTo {
                host: host.to_string(),
                port,
                reason: "connection refused".to_string(),
            },
            io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            _ => NetError::connection_failed_to(host, port, e),
        })
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }
}

/// Converts an elapsed `tokio::time::timeout` into `RequestTimedOut`.
pub trait TimeoutResultExt<T> {
    fn timeout_context(self, timeout: Duration) -> Result<T, NetError>;
}

impl<T> TimeoutResultExt<T> for Result<T, Elapsed> {
    fn timeout_context(self, timeout: Duration) -> Result<T, NetError> {
        self.map_err(|_| NetError::RequestTimedOut {
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}
