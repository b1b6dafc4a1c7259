//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): network and bridge error codes
//! - [`encoding`]: the base64 boundary encoding
//! - [`context`]: helpers that attach context to low-level failures

pub mod context;
pub mod encoding;
pub mod neterror;
