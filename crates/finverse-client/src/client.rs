//! Finverse domain operations
//!
//! Each operation is a path plus a body or query shape handed to the
//! `RequestPipeline`; responses are returned as the JSON the API sent. The only
//! operation with side effects on credentials is
//! `exchange_authorization_code`, which installs the returned `access_token`
//! as the user credential.

use std::sync::Arc;

use finverse_auth::{
    AUTHORIZATION_CODE_GRANT, AUTHORIZATION_TOKEN_PATH, CLIENT_CREDENTIALS_GRANT, ClientIdentity,
    Clock, CredentialManager, Error, FORM_CONTENT_TYPE, Result, SystemClock,
};
use serde_json::{Value, json};
use tracing::info;
use transport::{Method, ReqwestTransport, Transport};

use crate::config::ClientConfig;
use crate::pipeline::{RequestOptions, RequestPipeline};

pub const LINK_TOKEN_PATH: &str = "/link/token";
pub const ACCOUNTS_PATH: &str = "/accounts";
pub const TRANSACTIONS_PATH: &str = "/transactions";
pub const IDENTITY_PATH: &str = "/identity";
pub const STATEMENTS_PATH: &str = "/statements";
pub const COMPOSITE_STATEMENT_PATH: &str = "/composite_statement";
pub const CARD_DETAILS_PATH: &str = "/card_details";

/// Parameters for starting a Finverse Link session.
#[derive(Debug, Clone, Default)]
pub struct LinkTokenRequest {
    pub user_id: String,
    /// Opaque value echoed back on the redirect
    pub state: String,
    /// ISO country codes to offer; empty offers all
    pub country_codes: Vec<String>,
}

impl LinkTokenRequest {
    pub fn new(user_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            state: state.into(),
            country_codes: Vec::new(),
        }
    }

    pub fn with_countries<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.country_codes = codes.into_iter().map(Into::into).collect();
        self
    }
}

/// Optional narrowing for transaction and statement queries.
///
/// Unset fields are not sent. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub account_ids: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl QueryFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<(&'static str, String)> = self
            .account_ids
            .iter()
            .map(|id| ("account_ids", id.clone()))
            .collect();
        if let Some(start) = &self.start_date {
            pairs.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            pairs.push(("end_date", end.clone()));
        }
        pairs
    }
}

/// Client for the Finverse Data API.
pub struct FinverseClient {
    pipeline: RequestPipeline,
    redirect_uri: Option<String>,
}

impl FinverseClient {
    /// Build a client over `reqwest` using the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Sdk(format!("invalid client configuration: {e}")))?;
        let client_secret = config
            .client_secret()
            .cloned()
            .ok_or_else(|| Error::Sdk("client_secret is not configured".into()))?;

        let identity = ClientIdentity::new(
            config.client_id.clone(),
            client_secret,
            config.customer_app_id.clone(),
            config.base_url.clone(),
        );
        let credentials = CredentialManager::new(identity, transport.clone())?
            .with_clock(clock)
            .with_refresh_skew(config.refresh_skew());

        Ok(Self {
            pipeline: RequestPipeline::new(Arc::new(credentials), transport),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    pub fn credentials(&self) -> &CredentialManager {
        self.pipeline.credentials()
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Create a link token and URL for the Finverse Link UI, the first step of
    /// letting a user connect an institution.
    pub async fn generate_link_token(&self, request: &LinkTokenRequest) -> Result<Value> {
        let redirect_uri = self.require_redirect_uri("link token generation")?;
        let body = json!({
            "client_id": self.client_id(),
            "user_id": request.user_id,
            "redirect_uri": redirect_uri,
            "state": request.state,
            "response_mode": "form_post",
            "response_type": "code",
            "grant_type": CLIENT_CREDENTIALS_GRANT,
            "countries": request.country_codes,
            "link_mode": "real test",
            "ui_mode": "auto_redirect",
            "institution_status": "beta supported",
        });
        self.pipeline
            .execute(Method::POST, LINK_TOKEN_PATH, RequestOptions::new().json(body))
            .await
    }

    /// Exchange the code from the Link redirect for a user token.
    ///
    /// On success a string `access_token` in the response becomes the user
    /// credential for every later call on this client.
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<Value> {
        let redirect_uri = self.require_redirect_uri("authorization code exchange")?;
        let options = RequestOptions::new()
            .form([
                ("client_id", self.client_id()),
                ("code", code),
                ("grant_type", AUTHORIZATION_CODE_GRANT),
                ("redirect_uri", redirect_uri),
            ])
            .content_type(FORM_CONTENT_TYPE);

        let response = self
            .pipeline
            .execute(Method::POST, AUTHORIZATION_TOKEN_PATH, options)
            .await?;

        if let Some(token) = response.get("access_token").and_then(Value::as_str) {
            self.credentials().set_user_credential(token).await;
            info!("authorization code exchanged for user credential");
        }
        Ok(response)
    }

    pub async fn get_accounts(&self) -> Result<Value> {
        self.get(ACCOUNTS_PATH, None).await
    }

    pub async fn get_transactions(&self, filter: &QueryFilter) -> Result<Value> {
        self.get(TRANSACTIONS_PATH, Some(filter)).await
    }

    pub async fn get_identity(&self) -> Result<Value> {
        self.get(IDENTITY_PATH, None).await
    }

    pub async fn get_statements(&self, filter: &QueryFilter) -> Result<Value> {
        self.get(STATEMENTS_PATH, Some(filter)).await
    }

    pub async fn get_composite_statements(&self, filter: &QueryFilter) -> Result<Value> {
        self.get(COMPOSITE_STATEMENT_PATH, Some(filter)).await
    }

    pub async fn get_card_details(&self, filter: &QueryFilter) -> Result<Value> {
        self.get(CARD_DETAILS_PATH, Some(filter)).await
    }

    /// Current customer token, refreshed if needed. Mainly for debugging.
    pub async fn customer_token(&self) -> Result<String> {
        self.credentials().service_token().await
    }

    async fn get(&self, path: &str, filter: Option<&QueryFilter>) -> Result<Value> {
        let mut options = RequestOptions::new();
        if let Some(filter) = filter {
            options = options.query_pairs(filter.query_pairs());
        }
        self.pipeline.execute(Method::GET, path, options).await
    }

    fn client_id(&self) -> &str {
        &self.credentials().identity().client_id
    }

    fn require_redirect_uri(&self, operation: &str) -> Result<&str> {
        self.redirect_uri
            .as_deref()
            .ok_or_else(|| Error::Sdk(format!("redirect_uri must be configured for {operation}")))
    }
}
