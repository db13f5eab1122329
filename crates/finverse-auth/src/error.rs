//! Error taxonomy for Finverse API calls
//!
//! Every failure of the credential manager or the request pipeline ends up as
//! one of these variants. HTTP-derived variants keep the status code and the
//! parsed response body so callers can inspect what the API sent back.

use serde_json::Value;
use transport::TransportError;

/// Coarse classification of an [`Error`], for matching and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 401 from the API, or any failure while obtaining a customer token
    Auth,
    /// 429
    RateLimit,
    /// 400
    InvalidRequest,
    /// Any other non-2xx status
    Api,
    /// 2xx whose body is not valid JSON
    MalformedResponse,
    /// No HTTP response at all (connect, DNS, TLS, timeout)
    Transport,
    /// Local failure inside the SDK
    Sdk,
}

impl ErrorKind {
    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Api => "api",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Transport => "transport",
            ErrorKind::Sdk => "sdk",
        }
    }
}

/// Errors from Finverse API operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {message}")]
    Auth {
        /// `None` when no HTTP response was involved (e.g. network failure during refresh)
        status: Option<u16>,
        message: String,
        payload: Option<Value>,
    },

    #[error("rate limit exceeded: {message}")]
    RateLimit {
        status: u16,
        message: String,
        payload: Option<Value>,
    },

    #[error("invalid request: {message}")]
    InvalidRequest {
        status: u16,
        message: String,
        payload: Option<Value>,
    },

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        payload: Option<Value>,
    },

    #[error("failed to decode JSON response ({status}): {message}")]
    MalformedResponse { status: u16, message: String },

    #[error("network or connection error: {0}")]
    Transport(String),

    #[error("unexpected SDK error: {0}")]
    Sdk(String),
}

impl Error {
    /// Authentication failure with no HTTP response attached.
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            status: None,
            message: message.into(),
            payload: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth { .. } => ErrorKind::Auth,
            Error::RateLimit { .. } => ErrorKind::RateLimit,
            Error::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Error::Api { .. } => ErrorKind::Api,
            Error::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Sdk(_) => ErrorKind::Sdk,
        }
    }

    /// HTTP status, when the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } => *status,
            Error::RateLimit { status, .. }
            | Error::InvalidRequest { status, .. }
            | Error::Api { status, .. }
            | Error::MalformedResponse { status, .. } => Some(*status),
            Error::Transport(_) | Error::Sdk(_) => None,
        }
    }

    /// Human-readable message without the kind prefix that `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            Error::Auth { message, .. }
            | Error::RateLimit { message, .. }
            | Error::InvalidRequest { message, .. }
            | Error::Api { message, .. }
            | Error::MalformedResponse { message, .. } => message,
            Error::Transport(message) | Error::Sdk(message) => message,
        }
    }

    /// Structured response body, when it parsed as JSON.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Error::Auth { payload, .. }
            | Error::RateLimit { payload, .. }
            | Error::InvalidRequest { payload, .. }
            | Error::Api { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        if e.is_network() {
            Error::Transport(e.to_string())
        } else {
            Error::Sdk(e.to_string())
        }
    }
}

/// Result alias for Finverse operations.
pub type Result<T> = std::result::Result<T, Error>;
