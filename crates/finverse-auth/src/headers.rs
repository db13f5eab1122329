//! Header helpers shared by token refresh and the request pipeline

use transport::HeaderValue;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Fresh correlation identifier for the `X-Request-Id` header.
pub fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Build a header value, reporting which header was rejected.
pub fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Sdk(format!("invalid value for header {name}: {e}")))
}
