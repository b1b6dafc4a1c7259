//! Transport-safe encoding for payloads that cross the host boundary.
//!
//! HTTP bodies, inbound WebSocket frames, and outbound send payloads all use
//! standard padded base64 so arbitrary bytes survive a text-only channel.

use crate::base::neterror::NetError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode raw bytes for the caller.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a caller-supplied payload back to raw bytes.
pub fn decode(data: &str) -> Result<Vec<u8>, NetError> {
    STANDARD.decode(data.trim()).map_err(|e| {
        tracing::debug!("Rejected payload: {}", e);
        NetError::InvalidPayload
    })
}
