//! Credential manager: customer token cache and user token overlay
//!
//! The customer token is fetched lazily on first use and refreshed once
//! `now >= expires_at - refresh_skew`. The cache lock is held across the
//! refresh call, so concurrent callers on a shared client wait for the one
//! refresh in flight and reuse its result.
//!
//! A user token, once set, shadows the customer token completely: the refresh
//! path is never entered while it is present.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use transport::header::AUTHORIZATION;
use transport::{HeaderMap, HeaderValue, Transport};

use crate::clock::{Clock, SystemClock};
use crate::constants::{CUSTOMER_APP_ID_HEADER, DEFAULT_REFRESH_SKEW};
use crate::credential::{ClientIdentity, ServiceCredential, UserCredential};
use crate::error::{Error, Result};
use crate::headers::header_value;
use crate::token::request_customer_token;

/// Owns all credential state for one client instance.
pub struct CredentialManager {
    identity: ClientIdentity,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    refresh_skew: Duration,
    app_id_header: HeaderValue,
    service: Mutex<Option<ServiceCredential>>,
    user: RwLock<Option<UserCredential>>,
}

impl CredentialManager {
    /// Create a manager using the system clock and the default 5 minute skew.
    ///
    /// Fails if the customer app id cannot be sent as a header value.
    pub fn new(identity: ClientIdentity, transport: Arc<dyn Transport>) -> Result<Self> {
        let app_id_header = header_value(CUSTOMER_APP_ID_HEADER, &identity.customer_app_id)?;
        Ok(Self {
            identity,
            transport,
            clock: Arc::new(SystemClock),
            refresh_skew: DEFAULT_REFRESH_SKEW,
            app_id_header,
            service: Mutex::new(None),
            user: RwLock::new(None),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_refresh_skew(mut self, refresh_skew: Duration) -> Self {
        self.refresh_skew = refresh_skew;
        self
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn refresh_skew(&self) -> Duration {
        self.refresh_skew
    }

    /// `Authorization` and `X-Customer-App-ID` headers for an authenticated call.
    ///
    /// The bearer is the user token when one is set, otherwise the customer
    /// token (refreshed first if stale). Only a refresh failure makes this fail.
    pub async fn auth_headers(&self) -> Result<HeaderMap> {
        let user_token = self
            .user
            .read()
            .await
            .as_ref()
            .map(|u| u.access_token().to_owned());

        let bearer = match user_token {
            Some(token) => {
                debug!("authorizing with user credential");
                token
            }
            None => self.service_token().await?,
        };

        let mut authorization = HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|_| Error::auth("bearer token is not a valid header value"))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CUSTOMER_APP_ID_HEADER, self.app_id_header.clone());
        Ok(headers)
    }

    /// The customer token, refreshed first if absent or inside the skew window.
    pub async fn service_token(&self) -> Result<String> {
        let mut cached = self.service.lock().await;
        let now = self.clock.now_millis();

        match cached.as_ref() {
            Some(credential) if credential.is_usable(now, self.refresh_skew) => {
                return Ok(credential.token().to_owned());
            }
            Some(credential) => debug!(
                expires_at = credential.expires_at_millis(),
                now, "customer token stale, refreshing"
            ),
            None => debug!("no customer token cached, fetching"),
        }

        self.refresh_locked(&mut cached).await
    }

    /// Unconditionally replace the customer token.
    pub async fn refresh(&self) -> Result<String> {
        let mut cached = self.service.lock().await;
        self.refresh_locked(&mut cached).await
    }

    /// Snapshot of the cached customer token, without refreshing.
    pub async fn cached_service_credential(&self) -> Option<ServiceCredential> {
        self.service.lock().await.clone()
    }

    /// Install a user token; replaces any previous one.
    pub async fn set_user_credential(&self, access_token: impl Into<String>) {
        *self.user.write().await = Some(UserCredential::new(access_token));
        info!("user credential set");
    }

    /// Drop the user token so calls fall back to the customer token.
    ///
    /// Returns whether one was set.
    pub async fn clear_user_credential(&self) -> bool {
        let cleared = self.user.write().await.take().is_some();
        if cleared {
            info!("user credential cleared");
        }
        cleared
    }

    pub async fn has_user_credential(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// On failure the stale credential stays cached; the next access retries.
    async fn refresh_locked(&self, slot: &mut Option<ServiceCredential>) -> Result<String> {
        match request_customer_token(
            self.transport.as_ref(),
            &self.identity,
            self.clock.as_ref(),
        )
        .await
        {
            Ok(credential) => {
                metrics::counter!("finverse_token_refreshes_total", "outcome" => "success")
                    .increment(1);
                info!(
                    issued_at = credential.issued_at_millis(),
                    expires_at = credential.expires_at_millis(),
                    "customer token refreshed"
                );
                let token = credential.token().to_owned();
                *slot = Some(credential);
                Ok(token)
            }
            Err(e) => {
                metrics::counter!("finverse_token_refreshes_total", "outcome" => "failure")
                    .increment(1);
                warn!(error = %e, status = ?e.status_code(), "customer token refresh failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("identity", &self.identity)
            .field("refresh_skew", &self.refresh_skew)
            .finish_non_exhaustive()
    }
}
