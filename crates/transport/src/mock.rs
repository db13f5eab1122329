//! Scripted in-memory transport for tests

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

/// Transport that replays queued outcomes in order and records every request.
///
/// Sending with an empty queue yields `TransportError::Other`, so a test that
/// under-scripts its responses fails loudly instead of hanging.
#[derive(Debug, Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        lock(&self.outcomes).push_back(Ok(HttpResponse::new(status, body)));
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: &serde_json::Value) {
        self.push_response(status, body.to_string());
    }

    /// Queue a transport-level failure.
    pub fn push_error(&self, error: TransportError) {
        lock(&self.outcomes).push_back(Err(error));
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests whose URL path ends with `path`.
    pub fn count_path(&self, path: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| url_path(&r.url).ends_with(path))
            .count()
    }

    /// Outcomes queued but not yet consumed.
    pub fn pending(&self) -> usize {
        lock(&self.outcomes).len()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        let outcome = lock(&self.outcomes).pop_front().unwrap_or_else(|| {
            Err(TransportError::Other(format!(
                "no scripted response for {} {}",
                request.method, request.url
            )))
        });
        lock(&self.requests).push(request);
        Box::pin(async move { outcome })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// URL without its query string.
fn url_path(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
