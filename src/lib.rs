//! # netbridge
//!
//! A network bridge for host applications that cannot reach the network
//! themselves.
//!
//! `netbridge` forwards HTTP calls with a browser-like per-domain cookie jar
//! and multiplexes WebSocket connections identified by caller-chosen ids,
//! relaying their lifecycle through an event sink.
//!
//! ## Features
//!
//! - **HTTP forwarding**: never fails on non-2xx, follows redirects, raw
//!   bodies returned base64-encoded
//! - **Cookie jar**: `Set-Cookie` parsing with `Max-Age`/`Expires`, path
//!   matching, lazy expiry
//! - **WebSockets**: one task per connection, ordered `open`/`message`/
//!   `error`/`close` events per id
//! - **Teardown**: best-effort close of every socket, then a full reset
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use netbridge::{Bridge, ProxyRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut events) = tokio::sync::mpsc::unbounded_channel::<netbridge::SocketEvent>();
//!     let bridge = Bridge::builder().event_sink(tx).build();
//!
//!     let result = bridge.http_request(ProxyRequest::get("https://example.com")).await;
//!     println!("Status: {}", result.status);
//!
//!     bridge.socket_open("wss://echo.websocket.org", "s1");
//!     let event = events.recv().await.unwrap();
//!     println!("{} {}", event.topic(), event.payload());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type, context helpers and base64 encoding
//! - [`config`] - Timeouts and limits
//! - [`cookies`] - Cookie parsing and the per-domain jar
//! - [`http`] - Request forwarding and result shapes
//! - [`socket`] - TCP/TLS connection setup
//! - [`ws`] - WebSocket connections, registry and events
//! - [`lifecycle`] - Process teardown

pub mod base;
pub mod bridge;
pub mod config;
pub mod cookies;
pub mod http;
pub mod lifecycle;
pub mod socket;
pub mod ws;

pub use base::neterror::NetError;
pub use bridge::{Bridge, BridgeBuilder, SocketResult};
pub use config::BridgeConfig;
pub use http::{ProxyRequest, ProxyResult};
pub use lifecycle::ShutdownReport;
pub use ws::{EventSink, SocketEvent};
