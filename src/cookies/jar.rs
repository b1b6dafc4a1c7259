use crate::cookies::canonicalcookie::CanonicalCookie;
use dashmap::DashMap;
use time::OffsetDateTime;

/// Per-domain cookie storage shared by every proxied request.
///
/// Keys are hostnames exactly as they appeared in the request URL. Each
/// domain holds its cookies in arrival order with at most one cookie per
/// name. Expired cookies are filtered out when a `Cookie` header is built
/// rather than evicted eagerly.
#[derive(Debug, Default)]
pub struct CookieJar {
    // Store: Map<Domain, List<Cookie>>
    store: DashMap<String, Vec<CanonicalCookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie under `domain`, keyed by name.
    pub fn set_cookie(&self, domain: &str, cookie: CanonicalCookie) {
        let mut entry = self.store.entry(domain.to_string()).or_default();
        match entry.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => entry.push(cookie),
        }
    }

    /// Record every `Set-Cookie` value of a response from `domain`.
    pub fn record_response<I, S>(&self, domain: &str, set_cookie_values: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.record_response_at(domain, set_cookie_values, OffsetDateTime::now_utc())
    }

    /// Same as [`record_response`](Self::record_response) with an explicit
    /// clock, used for `Max-Age` arithmetic. Returns how many cookies were
    /// stored; unparseable values are skipped.
    pub fn record_response_at<I, S>(&self, domain: &str, set_cookie_values: I, now: OffsetDateTime) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stored = 0;
        for line in set_cookie_values {
            match CanonicalCookie::parse(line.as_ref(), now) {
                Some(cookie) => {
                    self.set_cookie(domain, cookie);
                    stored += 1;
                }
                None => {
                    tracing::debug!("Skipping Set-Cookie for {}: {:?}", domain, line.as_ref());
                }
            }
        }
        stored
    }

    /// Build the `Cookie` header value for a request to `domain` at `path`.
    ///
    /// Returns an empty string when nothing qualifies, in which case the
    /// header should be omitted.
    pub fn cookie_header_for(&self, domain: &str, path: &str, now: OffsetDateTime) -> String {
        let Some(entry) = self.store.get(domain) else {
            return String::new();
        };

        entry
            .iter()
            .filter(|c| !c.is_expired(now) && c.matches_path(path))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Snapshot of everything stored for `domain`, stale cookies included.
    pub fn cookies_for(&self, domain: &str) -> Vec<CanonicalCookie> {
        self.store.get(domain).map(|e| e.value().clone()).unwrap_or_default()
    }

    /// Number of domains with at least one stored cookie.
    pub fn domain_count(&self) -> usize {
        self.store.len()
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.store.clear();
    }
}
