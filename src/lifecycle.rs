//! Process-wide teardown.

use crate::cookies::jar::CookieJar;
use crate::ws::SocketRegistry;
use serde::Serialize;
use std::sync::Arc;

/// What [`LifecycleManager::shutdown`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Sockets a close was requested for.
    pub attempted: usize,
    /// `(id, error)` for every close that failed.
    pub failures: Vec<(String, String)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct LifecycleManager {
    registry: Arc<SocketRegistry>,
    cookie_jar: Arc<CookieJar>,
}

impl LifecycleManager {
    pub fn new(registry: Arc<SocketRegistry>, cookie_jar: Arc<CookieJar>) -> Self {
        Self { registry, cookie_jar }
    }

    /// Close every registered socket, then reset all state.
    ///
    /// A failing close does not stop the others. The registry is cleared
    /// afterwards whatever happened.
    pub fn shutdown(&self) -> ShutdownReport {
        let ids = self.registry.ids();
        let mut report = ShutdownReport {
            attempted: ids.len(),
            failures: Vec::new(),
        };

        for id in ids {
            if let Err(e) = self.registry.close(&id) {
                tracing::warn!("Failed to close socket {} during shutdown: {}", id, e);
                report.failures.push((id, e.to_string()));
            }
        }

        self.registry.clear();
        self.cookie_jar.clear();
        tracing::info!(
            "Shutdown closed {} socket(s), {} failure(s)",
            report.attempted,
            report.failures.len()
        );
        report
    }
}
