//! Live WebSocket connections keyed by caller-chosen ids.
//!
//! Each connection is driven by one spawned task. That task is the only
//! emitter of events for its id, which keeps per-id event order equal to
//! the order the transport produced them.

use super::connection::WebSocket;
use super::event::{EventSink, SocketEvent};
use super::message::{CloseCode, CloseFrame, Message};
use crate::base::encoding;
use crate::base::neterror::NetError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use url::Url;

/// Public view of an entry's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Connecting,
    Open,
}

enum EntryState {
    Connecting,
    Open(Arc<WebSocket>),
}

struct SocketEntry {
    /// Distinguishes this connection from a later one reusing the id.
    token: u64,
    state: EntryState,
    /// Dropped or fired when the entry leaves the map.
    shutdown: oneshot::Sender<()>,
}

/// Table of live connections.
pub struct SocketRegistry {
    entries: Arc<DashMap<String, SocketEntry>>,
    next_token: AtomicU64,
    sink: Arc<dyn EventSink>,
    close_timeout: Duration,
}

impl SocketRegistry {
    pub fn new(sink: Arc<dyn EventSink>, close_timeout: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_token: AtomicU64::new(1),
            sink,
            close_timeout,
        }
    }

    /// Register `id` and start connecting to `url` in the background.
    ///
    /// Returns once the attempt has started; the outcome arrives as an
    /// `open` or `error`/`close` event. Fails with `NoRuntime` outside a
    /// Tokio runtime.
    pub fn open(&self, url: &str, id: &str) -> Result<(), NetError> {
        let url = WebSocket::validate_url(url)?;
        let runtime = Handle::try_current().map_err(|_| NetError::NoRuntime)?;
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        match self.entries.entry(id.to_string()) {
            Entry::Occupied(_) => return Err(NetError::SocketIdInUse(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(SocketEntry {
                    token,
                    state: EntryState::Connecting,
                    shutdown: shutdown_tx,
                });
            }
        }

        tracing::info!("Opening socket {} to {}", id, url);
        let task = ConnectionTask {
            id: id.to_string(),
            token,
            url,
            entries: self.entries.clone(),
            sink: self.sink.clone(),
            close_timeout: self.close_timeout,
        };
        runtime.spawn(task.run(shutdown_rx));
        Ok(())
    }

    /// Send base64-encoded `data` as one binary frame.
    pub async fn send(&self, id: &str, data: &str) -> Result<(), NetError> {
        let ws = {
            let entry = self
                .entries
                .get(id)
                .ok_or_else(|| NetError::SocketNotFound(id.to_string()))?;
            match &entry.state {
                EntryState::Open(ws) => ws.clone(),
                EntryState::Connecting => return Err(NetError::SocketNotOpen(id.to_string())),
            }
        };
        let bytes = encoding::decode(data)?;
        tracing::debug!("Sending {} bytes on {}", bytes.len(), id);
        ws.send(Message::Binary(bytes.into())).await
    }

    /// Remove `id` and ask its task to close the transport.
    ///
    /// Unknown ids are a no-op, so repeated closes succeed.
    pub fn close(&self, id: &str) -> Result<(), NetError> {
        match self.entries.remove(id) {
            Some((_, entry)) => {
                tracing::info!("Closing socket {}", id);
                // The task may already be finishing on its own.
                let _ = entry.shutdown.send(());
            }
            None => tracing::debug!("Close for unknown socket {}", id),
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the registered ids.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn state(&self, id: &str) -> Option<SocketState> {
        self.entries.get(id).map(|e| match e.state {
            EntryState::Connecting => SocketState::Connecting,
            EntryState::Open(_) => SocketState::Open,
        })
    }

    /// Drop every entry. Their tasks see the dropped signal and close.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Drives one connection from handshake to close.
struct ConnectionTask {
    id: String,
    token: u64,
    url: Url,
    entries: Arc<DashMap<String, SocketEntry>>,
    sink: Arc<dyn EventSink>,
    close_timeout: Duration,
}

impl ConnectionTask {
    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let ws = tokio::select! {
            res = WebSocket::connect(&self.url) => match res {
                Ok(ws) => Arc::new(ws),
                Err(e) => {
                    tracing::debug!("Socket {} failed to connect: {}", self.id, e);
                    self.emit_error(&e);
                    self.finish(CloseFrame::abnormal());
                    return;
                }
            },
            _ = &mut shutdown => {
                tracing::debug!("Socket {} closed while connecting", self.id);
                self.finish(CloseFrame::abnormal());
                return;
            }
        };

        if !self.mark_open(&ws) {
            // Closed between handshake completion and registration.
            let frame = self.close_gracefully(&ws).await;
            self.finish(frame);
            return;
        }
        self.sink.emit(SocketEvent::Open { id: self.id.clone() });

        let mut peer_close: Option<CloseFrame> = None;
        let frame = loop {
            tokio::select! {
                _ = &mut shutdown => break self.close_gracefully(&ws).await,
                next = ws.recv() => match next {
                    Ok(Some(Message::Close(frame))) => {
                        peer_close = Some(
                            frame.unwrap_or_else(|| CloseFrame::new(CloseCode::NO_STATUS, "")),
                        );
                    }
                    Ok(Some(msg)) => self.relay(&msg),
                    Ok(None) => break peer_close.take().unwrap_or_else(CloseFrame::abnormal),
                    Err(_) if peer_close.is_some() => {
                        break peer_close.take().unwrap_or_else(CloseFrame::abnormal)
                    }
                    Err(e) => {
                        self.emit_error(&e);
                        break CloseFrame::abnormal();
                    }
                },
            }
        };

        self.finish(frame);
    }

    /// Switch our entry to `Open`. False when the entry is gone or belongs
    /// to a newer connection.
    fn mark_open(&self, ws: &Arc<WebSocket>) -> bool {
        match self.entries.get_mut(&self.id) {
            Some(mut entry) if entry.token == self.token => {
                entry.state = EntryState::Open(ws.clone());
                true
            }
            _ => false,
        }
    }

    /// Caller-initiated close handshake, bounded by `close_timeout`.
    async fn close_gracefully(&self, ws: &WebSocket) -> CloseFrame {
        if let Err(e) = ws.close(CloseFrame::normal()).await {
            tracing::debug!("Socket {} close frame not sent: {}", self.id, e);
            return CloseFrame::normal();
        }

        let wait_for_peer = async {
            loop {
                match ws.recv().await {
                    Ok(Some(Message::Close(Some(frame)))) => return Some(frame),
                    Ok(Some(Message::Close(None))) | Ok(None) | Err(_) => return None,
                    Ok(Some(_)) => continue,
                }
            }
        };

        match tokio::time::timeout(self.close_timeout, wait_for_peer).await {
            Ok(Some(frame)) => frame,
            Ok(None) => CloseFrame::normal(),
            Err(_) => {
                tracing::debug!("Socket {} peer did not answer close in time", self.id);
                CloseFrame::normal()
            }
        }
    }

    fn relay(&self, msg: &Message) {
        if let Some((payload, is_binary)) = msg.relayed_payload() {
            self.sink.emit(SocketEvent::Message {
                id: self.id.clone(),
                data: encoding::encode(payload),
                is_binary,
            });
        }
    }

    fn emit_error(&self, e: &NetError) {
        self.sink.emit(SocketEvent::Error {
            id: self.id.clone(),
            error: e.to_string(),
        });
    }

    /// Remove our own entry, then report the close. Removal comes first so
    /// the id is reusable by the time the host sees the event.
    fn finish(&self, frame: CloseFrame) {
        let token = self.token;
        self.entries.remove_if(&self.id, |_, entry| entry.token == token);
        tracing::info!("Socket {} closed ({})", self.id, frame.code.0);
        self.sink.emit(SocketEvent::Close {
            id: self.id.clone(),
            code: frame.code.0,
            reason: frame.reason,
        });
    }
}
