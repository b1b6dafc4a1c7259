use time::{OffsetDateTime, PrimitiveDateTime};

/// A cookie as stored in the jar.
/// Loosely modeled after Chromium's `net::CanonicalCookie`, reduced to the
/// attributes a session-carrying proxy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    /// `None` means a session cookie.
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
}

impl CanonicalCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            creation_time: now,
            expiration_time: None,
            secure: false,
            http_only: false,
        }
    }

    /// Parse one `Set-Cookie` header value.
    ///
    /// Returns `None` when the leading `name=value` pair is missing or has an
    /// empty name; the caller skips such headers. `Max-Age` wins over
    /// `Expires` wherever it appears, and a non-positive `Max-Age` yields a
    /// cookie that is already stale at `now`.
    pub fn parse(line: &str, now: OffsetDateTime) -> Option<Self> {
        let parsed = match cookie::Cookie::parse(line) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Failed to parse cookie {:?}: {}", line, e);
                return None;
            }
        };

        let path = match parsed.path() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => "/".to_string(),
        };

        let expiration_time = match parsed.max_age() {
            Some(max_age) => Some(now.checked_add(max_age).unwrap_or_else(|| {
                tracing::debug!("Max-Age out of range in {:?}, clamping", line);
                if max_age.is_negative() {
                    now
                } else {
                    PrimitiveDateTime::MAX.assume_utc()
                }
            })),
            None => parsed.expires().and_then(|e| e.datetime()),
        };

        Some(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            path,
            creation_time: now,
            expiration_time,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
        })
    }

    /// A cookie is live while `now` is strictly before its expiry.
    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_time {
            Some(expiry) => expiry <= current_time,
            None => false,
        }
    }

    /// Plain prefix match of the request path against the cookie path.
    pub fn matches_path(&self, request_path: &str) -> bool {
        request_path.starts_with(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

    #[test]
    fn test_parse_name_value_only() {
        let c = CanonicalCookie::parse("session=abc", NOW).unwrap();
        assert_eq!(c.name, "session");
        assert_eq!(c.value, "abc");
        assert_eq!(c.path, "/");
        assert!(c.expiration_time.is_none());
        assert!(!c.secure && !c.http_only);
    }

    #[test]
    fn test_parse_value_keeps_later_equals() {
        let c = CanonicalCookie::parse("token=a=b=c; Path=/api", NOW).unwrap();
        assert_eq!(c.value, "a=b=c");
        assert_eq!(c.path, "/api");
    }

    #[test]
    fn test_parse_empty_value() {
        let c = CanonicalCookie::parse("flag=; Secure", NOW).unwrap();
        assert_eq!(c.value, "");
        assert!(c.secure);
    }

    #[test]
    fn test_parse_rejects_missing_pair() {
        assert!(CanonicalCookie::parse("garbage", NOW).is_none());
        assert!(CanonicalCookie::parse("=value", NOW).is_none());
    }

    #[test]
    fn test_attributes_case_insensitive() {
        let c = CanonicalCookie::parse("a=1; PATH=/x; HTTPONLY; sEcUrE; Unknown=z", NOW).unwrap();
        assert_eq!(c.path, "/x");
        assert!(c.http_only);
        assert!(c.secure);
    }

    #[test]
    fn test_expires_attribute() {
        let c = CanonicalCookie::parse("a=1; Expires=Wed, 21 Oct 2026 07:28:00 GMT", NOW).unwrap();
        assert_eq!(c.expiration_time, Some(datetime!(2026-10-21 07:28:00 UTC)));
    }

    #[test]
    fn test_max_age_overrides_expires() {
        let c = CanonicalCookie::parse(
            "a=1; Max-Age=60; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
            NOW,
        )
        .unwrap();
        assert_eq!(c.expiration_time, Some(NOW + Duration::seconds(60)));

        let c = CanonicalCookie::parse(
            "a=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT; max-age=60",
            NOW,
        )
        .unwrap();
        assert_eq!(c.expiration_time, Some(NOW + Duration::seconds(60)));
    }

    #[test]
    fn test_zero_max_age_is_stale() {
        let c = CanonicalCookie::parse("a=1; Max-Age=0", NOW).unwrap();
        assert!(c.is_expired(NOW));
    }

    #[test]
    fn test_huge_max_age_is_clamped() {
        let c = CanonicalCookie::parse("a=1; Max-Age=99999999999999", NOW).unwrap();
        assert_eq!(c.expiration_time, Some(PrimitiveDateTime::MAX.assume_utc()));
        assert!(!c.is_expired(NOW + Duration::days(3650)));
    }

    #[test]
    fn test_session_cookie_never_expires() {
        let c = CanonicalCookie::new("a", "1", NOW);
        assert!(!c.is_expired(NOW + Duration::days(3650)));
    }

    #[test]
    fn test_matches_path() {
        let mut c = CanonicalCookie::new("a", "1", NOW);
        c.path = "/a".to_string();
        assert!(c.matches_path("/a"));
        assert!(c.matches_path("/a/b"));
        assert!(!c.matches_path("/"));
        assert!(!c.matches_path("/b"));
    }
}
