//! HTTP forwarding with the shared cookie jar.
//!
//! [`proxy::HttpProxy`] validates a [`result::ProxyRequest`], follows
//! redirects one [`transaction::HttpNetworkTransaction`] at a time and
//! packages the final response as a [`result::ProxyResult`].

pub mod proxy;
pub mod response;
pub mod result;
pub mod streamfactory;
pub mod transaction;

pub use proxy::HttpProxy;
pub use response::HttpResponse;
pub use result::{ProxyRequest, ProxyResult};
