//! HTTP transport abstraction for the Finverse client
//!
//! Defines the `Transport` trait that decouples request construction and error
//! classification from the network stack. `ReqwestTransport` is the production
//! implementation; `MockTransport` (feature `test-util`) scripts responses and
//! records requests so callers can assert exactly which calls went out.
//!
//! The transport knows nothing about Finverse: it takes an absolute URL, a
//! header map and an already-encoded body, and returns status, headers and
//! body bytes. Any response, whatever its status, is `Ok`. Only failures to
//! obtain a response at all are `Err`.

#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod reqwest_transport;

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTransport;
pub use reqwest::Method;
pub use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use reqwest_transport::ReqwestTransport;

use std::future::Future;
use std::pin::Pin;

/// Failure to get any HTTP response back from the remote side.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection refused/reset, DNS resolution, TLS handshake, dropped body.
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request could not be built or sent for a reason unrelated to the network.
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure happened on the network rather than locally.
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including any query string.
    pub url: String,
    pub headers: HeaderMap,
    /// Encoded body bytes; `None` sends no body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Body decoded as UTF-8, lossily. Intended for logging and assertions.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Header value as a string, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response as received, regardless of status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends prepared requests to the remote service.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
/// Timeouts and connection pooling are implementation configuration; callers
/// never retry.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>>;
}
