//! WebSocket support: a registry of caller-identified connections whose
//! lifecycle is reported through an [`EventSink`].
//!
//! # Example
//! ```ignore
//! use netbridge::ws::{SocketRegistry, SocketEvent};
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SocketEvent>();
//! let registry = SocketRegistry::new(Arc::new(tx), Duration::from_secs(5));
//! registry.open("wss://echo.websocket.org", "s1")?;
//! while let Some(event) = rx.recv().await {
//!     println!("{} {}", event.topic(), event.payload());
//! }
//! ```

mod connection;
mod event;
mod message;
mod registry;

pub use connection::WebSocket;
pub use event::{EventSink, SocketEvent, TopicSink};
pub use message::{CloseCode, CloseFrame, Message};
pub use registry::{SocketRegistry, SocketState};
