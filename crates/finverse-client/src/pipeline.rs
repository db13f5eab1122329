//! Request pipeline
//!
//! Builds every outbound API call: absolute URL, content type, a fresh
//! correlation id and (unless disabled) the credential manager's auth headers.
//! Encodes the body, dispatches it through the transport and classifies any
//! failure into `finverse_auth::Error`.
//!
//! Body precedence: GET sends only the query string. For other methods a form
//! body wins over a JSON body when both are set; query parameters are ignored.

use std::sync::Arc;

use finverse_auth::{
    CredentialManager, Error, JSON_CONTENT_TYPE, REQUEST_ID_HEADER, Result, classify_status,
    header_value, new_request_id,
};
use serde_json::Value;
use tracing::{debug, warn};
use transport::header::CONTENT_TYPE;
use transport::{HeaderMap, HttpRequest, Method, Transport};

/// Per-call options. `RequestOptions::new()` is an authenticated JSON call with no body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    json: Option<Value>,
    form: Option<Vec<(String, String)>>,
    requires_auth: bool,
    content_type: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            query: Vec::new(),
            json: None,
            form: None,
            requires_auth: true,
            content_type: JSON_CONTENT_TYPE.to_owned(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter. Repeated keys are sent repeatedly. GET only.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Percent-encoded `key=value` body. Takes precedence over `json`.
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Skip the credential manager entirely.
    pub fn unauthenticated(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Sends API calls on behalf of domain operations.
pub struct RequestPipeline {
    base_url: String,
    transport: Arc<dyn Transport>,
    credentials: Arc<CredentialManager>,
}

impl RequestPipeline {
    /// The base URL is taken from the credential manager's identity.
    pub fn new(credentials: Arc<CredentialManager>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: credentials.identity().base_url.clone(),
            transport,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one API call and return the JSON body as sent by the server.
    pub async fn execute(&self, method: Method, path: &str, options: RequestOptions) -> Result<Value> {
        let request_id = new_request_id();
        let result = self.dispatch(&method, path, options, &request_id).await;
        if let Err(e) = &result {
            crate::metrics::record_error(e.kind());
            warn!(
                %request_id,
                %method,
                path,
                kind = e.kind().label(),
                status = ?e.status_code(),
                error = %e,
                "request failed"
            );
        }
        result
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        options: RequestOptions,
        request_id: &str,
    ) -> Result<Value> {
        let request = self.build(method, path, options, request_id).await?;

        debug!(%request_id, %method, path, "dispatching request");
        let response = self.transport.send(request).await?;
        crate::metrics::record_request(method, response.status);

        if !response.is_success() {
            return Err(classify_status(response.status, &response.body));
        }

        serde_json::from_slice(&response.body).map_err(|e| Error::MalformedResponse {
            status: response.status,
            message: e.to_string(),
        })
    }

    async fn build(
        &self,
        method: &Method,
        path: &str,
        options: RequestOptions,
        request_id: &str,
    ) -> Result<HttpRequest> {
        let RequestOptions {
            query,
            json,
            form,
            requires_auth,
            content_type,
        } = options;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, header_value("content-type", &content_type)?);
        if requires_auth {
            headers.extend(self.credentials.auth_headers().await?);
        }
        headers.insert(REQUEST_ID_HEADER, header_value(REQUEST_ID_HEADER, request_id)?);

        let mut url = format!("{}{}", self.base_url, path);
        let body = if *method == Method::GET {
            if !query.is_empty() {
                url.push('?');
                url.push_str(&encode_pairs(&query));
            }
            None
        } else if let Some(form) = form {
            Some(encode_pairs(&form).into_bytes())
        } else if let Some(json) = json {
            Some(
                serde_json::to_vec(&json)
                    .map_err(|e| Error::Sdk(format!("encoding JSON body: {e}")))?,
            )
        } else {
            None
        };

        Ok(HttpRequest {
            method: method.clone(),
            url,
            headers,
            body,
        })
    }
}

/// `application/x-www-form-urlencoded` serialization, also used for query strings.
fn encode_pairs(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
