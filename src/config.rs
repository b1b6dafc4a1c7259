//! Bridge configuration.

use serde::Deserialize;
use std::time::Duration;

/// Fallback `Content-Type` reported when a response omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Tunables for the HTTP proxy and the socket registry.
///
/// Deserializes from the host's settings with every field optional:
///
/// ```
/// let config: netbridge::config::BridgeConfig =
///     serde_json::from_str(r#"{ "max_redirects": 2 }"#).unwrap();
/// assert_eq!(config.max_redirects, 2);
/// assert_eq!(config.request_timeout.as_secs(), 30);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upper bound for one proxied HTTP call, redirects and body included
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Redirect hops followed before the call fails
    pub max_redirects: usize,
    /// Reported when the response has no Content-Type
    pub default_content_type: String,
    /// How long a caller-initiated close waits for the peer's close frame
    #[serde(with = "duration_secs")]
    pub close_timeout: Duration,
    /// Sent as `User-Agent` when the caller supplies none
    pub user_agent: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_redirects: 5,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            close_timeout: Duration::from_secs(5),
            user_agent: None,
        }
    }
}

impl BridgeConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the redirect limit.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the fallback content type.
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Set the close handshake timeout.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set the default User-Agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number of seconds"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
