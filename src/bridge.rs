//! The host-facing facade.
//!
//! Every operation resolves to a result value; nothing here returns an
//! `Err` to the host.
//!
//! # Example
//!
//! ```rust,no_run
//! use netbridge::{Bridge, BridgeConfig, ProxyRequest};
//!
//! # async fn run() {
//! let (tx, mut events) = tokio::sync::mpsc::unbounded_channel::<netbridge::SocketEvent>();
//! let bridge = Bridge::builder()
//!     .config(BridgeConfig::new().max_redirects(3))
//!     .event_sink(tx)
//!     .build();
//!
//! let result = bridge.http_request(ProxyRequest::get("https://example.com")).await;
//! println!("{} {}", result.status, result.content_type);
//!
//! bridge.socket_open("wss://echo.websocket.org", "s1");
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.topic());
//! }
//! # }
//! ```

use crate::base::neterror::NetError;
use crate::config::BridgeConfig;
use crate::cookies::jar::CookieJar;
use crate::http::{HttpProxy, ProxyRequest, ProxyResult};
use crate::lifecycle::{LifecycleManager, ShutdownReport};
use crate::socket::tls::TlsConfig;
use crate::ws::{EventSink, SocketEvent, SocketRegistry};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of a socket operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SocketResult {
    fn opened(id: &str) -> Self {
        Self { success: true, id: Some(id.to_string()), error: None }
    }

    fn done() -> Self {
        Self { success: true, id: None, error: None }
    }

    fn failed(err: &NetError) -> Self {
        Self { success: false, id: None, error: Some(err.to_string()) }
    }

    fn from_result(res: Result<(), NetError>) -> Self {
        match res {
            Ok(()) => Self::done(),
            Err(e) => Self::failed(&e),
        }
    }
}

/// HTTP proxy, socket registry and teardown behind one handle.
///
/// Cheap to clone; clones share the jar and the registry.
#[derive(Clone)]
pub struct Bridge {
    proxy: Arc<HttpProxy>,
    registry: Arc<SocketRegistry>,
    lifecycle: Arc<LifecycleManager>,
    cookie_jar: Arc<CookieJar>,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    /// Forward an HTTP call with the shared cookie jar.
    pub async fn http_request(&self, req: ProxyRequest) -> ProxyResult {
        self.proxy.request(req).await
    }

    /// Start connecting `id` to `url`. Outside a Tokio runtime this reports a
    /// failure.
    pub fn socket_open(&self, url: &str, id: &str) -> SocketResult {
        match self.registry.open(url, id) {
            Ok(()) => SocketResult::opened(id),
            Err(e) => {
                tracing::debug!("socket_open {} rejected: {}", id, e);
                SocketResult::failed(&e)
            }
        }
    }

    /// Send base64 `data` on an open socket.
    pub async fn socket_send(&self, id: &str, data: &str) -> SocketResult {
        SocketResult::from_result(self.registry.send(id, data).await)
    }

    pub fn socket_close(&self, id: &str) -> SocketResult {
        SocketResult::from_result(self.registry.close(id))
    }

    pub fn shutdown(&self) -> ShutdownReport {
        self.lifecycle.shutdown()
    }

    pub fn cookie_jar(&self) -> &Arc<CookieJar> {
        &self.cookie_jar
    }

    pub fn registry(&self) -> &Arc<SocketRegistry> {
        &self.registry
    }
}

/// Builder for a [`Bridge`].
#[derive(Default)]
pub struct BridgeBuilder {
    config: Option<BridgeConfig>,
    tls: Option<TlsConfig>,
    sink: Option<Arc<dyn EventSink>>,
}

impl BridgeBuilder {
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// TLS settings for proxied HTTPS calls.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Where socket events go.
    pub fn event_sink<S: EventSink>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> Bridge {
        let config = self.config.unwrap_or_default();
        let sink = self.sink.unwrap_or_else(|| {
            tracing::debug!("No event sink configured, socket events are discarded");
            let (tx, _rx) = mpsc::unbounded_channel::<SocketEvent>();
            Arc::new(tx) as Arc<dyn EventSink>
        });

        let cookie_jar = Arc::new(CookieJar::new());
        let registry = Arc::new(SocketRegistry::new(sink, config.close_timeout));
        let lifecycle = Arc::new(LifecycleManager::new(registry.clone(), cookie_jar.clone()));
        let proxy = Arc::new(HttpProxy::with_tls(
            cookie_jar.clone(),
            config,
            self.tls.unwrap_or_default(),
        ));

        Bridge { proxy, registry, lifecycle, cookie_jar }
    }
}
