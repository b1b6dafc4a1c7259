//! Lifecycle events relayed to the host, and the channel they travel on.

use serde_json::{json, Value};
use tokio::sync::mpsc;

/// One event for one connection id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open { id: String },
    /// `data` is base64 of the frame payload.
    Message { id: String, data: String, is_binary: bool },
    Error { id: String, error: String },
    Close { id: String, code: u16, reason: String },
}

impl SocketEvent {
    pub fn id(&self) -> &str {
        match self {
            SocketEvent::Open { id }
            | SocketEvent::Message { id, .. }
            | SocketEvent::Error { id, .. }
            | SocketEvent::Close { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SocketEvent::Open { .. } => "open",
            SocketEvent::Message { .. } => "message",
            SocketEvent::Error { .. } => "error",
            SocketEvent::Close { .. } => "close",
        }
    }

    /// `<id>:<kind>`, e.g. `s1:message`.
    pub fn topic(&self) -> String {
        format!("{}:{}", self.id(), self.kind())
    }

    pub fn payload(&self) -> Value {
        match self {
            SocketEvent::Open { .. } => Value::Null,
            SocketEvent::Message { data, is_binary, .. } => {
                json!({ "data": data, "isBinary": is_binary })
            }
            SocketEvent::Error { error, .. } => json!({ "error": error }),
            SocketEvent::Close { code, reason, .. } => json!({ "code": code, "reason": reason }),
        }
    }
}

/// Where the registry delivers events.
///
/// Called from connection tasks; implementations must not block.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: SocketEvent);
}

impl EventSink for mpsc::UnboundedSender<SocketEvent> {
    fn emit(&self, event: SocketEvent) {
        if let Err(e) = self.send(event) {
            tracing::debug!("Event receiver gone, dropping {}", e.0.topic());
        }
    }
}

/// Adapts a host `emit(topic, payload)` callback.
///
/// ```
/// use netbridge::ws::{EventSink, SocketEvent, TopicSink};
///
/// let sink = TopicSink::new(|topic, payload| {
///     assert_eq!(topic, "s1:close");
///     assert_eq!(payload["code"], 1000);
/// });
/// sink.emit(SocketEvent::Close { id: "s1".into(), code: 1000, reason: String::new() });
/// ```
pub struct TopicSink<F> {
    emit: F,
}

impl<F> TopicSink<F>
where
    F: Fn(String, Value) + Send + Sync + 'static,
{
    pub fn new(emit: F) -> Self {
        Self { emit }
    }
}

impl<F> EventSink for TopicSink<F>
where
    F: Fn(String, Value) + Send + Sync + 'static,
{
    fn emit(&self, event: SocketEvent) {
        (self.emit)(event.topic(), event.payload());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_topics() {
        let open = SocketEvent::Open { id: "s1".into() };
        assert_eq!(open.topic(), "s1:open");
        assert_eq!(open.payload(), Value::Null);

        let err = SocketEvent::Error { id: "a:b".into(), error: "boom".into() };
        assert_eq!(err.topic(), "a:b:error");
        assert_eq!(err.payload(), json!({ "error": "boom" }));
    }

    #[test]
    fn test_message_payload_shape() {
        let msg = SocketEvent::Message { id: "s1".into(), data: "aGk=".into(), is_binary: false };
        assert_eq!(msg.payload(), json!({ "data": "aGk=", "isBinary": false }));
        assert_eq!(msg.id(), "s1");
    }

    #[test]
    fn test_channel_sink_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.emit(SocketEvent::Open { id: "s1".into() });
    }

    #[test]
    fn test_topic_sink_forwards() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let sink = TopicSink::new(move |topic, payload| {
            seen2.lock().unwrap().push((topic, payload));
        });
        sink.emit(SocketEvent::Close { id: "x".into(), code: 1006, reason: String::new() });

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "x:close");
        assert_eq!(seen[0].1, json!({ "code": 1006, "reason": "" }));
    }
}
