//! Cookie storage for proxied HTTP traffic.
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`CookieJar`](jar::CookieJar) | Per-domain store, header computation |
//! | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | One parsed `Set-Cookie` |
//!
//! # Example
//!
//! ```rust
//! use netbridge::cookies::jar::CookieJar;
//! use time::OffsetDateTime;
//!
//! let jar = CookieJar::new();
//! let now = OffsetDateTime::now_utc();
//! jar.record_response_at("example.com", ["session=abc; Path=/; Max-Age=60"], now);
//! assert_eq!(jar.cookie_header_for("example.com", "/a/b", now), "session=abc");
//! ```

pub mod canonicalcookie;
pub mod jar;
