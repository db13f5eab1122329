//! Credential value types

use std::time::Duration;

use common::Secret;

/// Who the SDK authenticates as, fixed for the life of a client.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub customer_app_id: String,
    /// No trailing slash; paths are appended verbatim.
    pub base_url: String,
}

impl ClientIdentity {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<Secret<String>>,
        customer_app_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            customer_app_id: customer_app_id.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Customer token from the client-credentials grant.
///
/// `issued_at` and `expires_at` are unix milliseconds (absolute). A credential
/// is never mutated; each refresh produces a new one.
#[derive(Debug, Clone)]
pub struct ServiceCredential {
    token: Secret<String>,
    issued_at: i64,
    expires_at: i64,
}

impl ServiceCredential {
    /// `lifetime_millis` may be zero or negative, which makes the credential stale immediately.
    pub fn new(token: impl Into<String>, issued_at: i64, lifetime_millis: i64) -> Self {
        Self {
            token: Secret::new(token.into()),
            issued_at,
            expires_at: issued_at.saturating_add(lifetime_millis),
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose()
    }

    pub fn issued_at_millis(&self) -> i64 {
        self.issued_at
    }

    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at
    }

    /// Last instant (exclusive) at which the credential is still handed out.
    pub fn usable_until_millis(&self, skew: Duration) -> i64 {
        let skew = i64::try_from(skew.as_millis()).unwrap_or(i64::MAX);
        self.expires_at.saturating_sub(skew)
    }

    /// `now < expires_at - skew`
    pub fn is_usable(&self, now_millis: i64, skew: Duration) -> bool {
        now_millis < self.usable_until_millis(skew)
    }
}

/// End-user token from the authorization-code exchange.
///
/// Not tracked for expiry: the API rejects an expired one with a 401.
#[derive(Debug, Clone)]
pub struct UserCredential {
    access_token: Secret<String>,
}

impl UserCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
        }
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose()
    }
}
