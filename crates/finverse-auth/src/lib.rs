//! Finverse credential lifecycle
//!
//! Obtains and caches the customer (service-level) token, refreshes it lazily
//! ahead of expiry, and layers an optional user token obtained from an
//! authorization-code exchange on top of it. Also owns the error taxonomy and
//! the HTTP failure classification shared with the request pipeline.
//!
//! Credential flow:
//! 1. Caller asks `CredentialManager::auth_headers()` before each request
//! 2. With a user token set, it is used as the bearer and nothing else happens
//! 3. Otherwise the cached customer token is returned while it is usable
//! 4. Once `now >= expires_at - refresh_skew`, `token::request_customer_token()`
//!    replaces it before returning
//! 5. A failed refresh is always an `Error::Auth`; the next call retries

pub mod classify;
pub mod clock;
pub mod constants;
pub mod credential;
pub mod error;
pub mod headers;
pub mod manager;
pub mod token;

pub use classify::{FailureBody, classify_status};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use constants::*;
pub use credential::{ClientIdentity, ServiceCredential, UserCredential};
pub use error::{Error, ErrorKind, Result};
pub use headers::{header_value, new_request_id};
pub use manager::CredentialManager;
pub use token::request_customer_token;
