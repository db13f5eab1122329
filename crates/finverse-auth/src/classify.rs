//! HTTP failure classification
//!
//! Maps a non-2xx response onto the error taxonomy. The body is parsed as JSON
//! when possible; its `message` field becomes the error message, otherwise the
//! raw body text is used. Classification depends only on status and body, so
//! the same response always produces the same error.

use serde_json::Value;

use crate::error::Error;

/// Message and structured payload extracted from an error response body.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureBody {
    pub message: String,
    pub payload: Option<Value>,
}

impl FailureBody {
    pub fn parse(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).into_owned();
        let payload = serde_json::from_slice::<Value>(body).ok();

        let message = payload
            .as_ref()
            .and_then(Value::as_object)
            .and_then(|object| object.get("message"))
            .filter(|m| !m.is_null())
            .map(|m| match m.as_str() {
                Some(s) => s.to_owned(),
                None => m.to_string(),
            })
            .unwrap_or(text);

        Self { message, payload }
    }
}

/// Classify a non-2xx response.
///
/// 401 → `Auth`, 429 → `RateLimit`, 400 → `InvalidRequest`, anything else → `Api`.
/// All variants carry the status code and parsed payload.
pub fn classify_status(status: u16, body: &[u8]) -> Error {
    let FailureBody { message, payload } = FailureBody::parse(body);
    match status {
        401 => Error::Auth {
            status: Some(status),
            message,
            payload,
        },
        429 => Error::RateLimit {
            status,
            message,
            payload,
        },
        400 => Error::InvalidRequest {
            status,
            message,
            payload,
        },
        _ => Error::Api {
            status,
            message,
            payload,
        },
    }
}
