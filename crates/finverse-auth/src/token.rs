//! Customer token exchange
//!
//! POSTs the client credentials to `CUSTOMER_TOKEN_PATH` and turns the
//! response into a `ServiceCredential`. Whatever goes wrong (transport failure,
//! error status, undecodable body, missing `access_token`) comes back as
//! `Error::Auth`: to the caller a failed refresh always means "cannot
//! authenticate".

use serde::{Deserialize, Serialize};
use tracing::debug;
use transport::header::CONTENT_TYPE;
use transport::{HeaderValue, HttpRequest, Method, Transport};

use crate::classify::classify_status;
use crate::clock::Clock;
use crate::constants::{
    CLIENT_CREDENTIALS_GRANT, CUSTOMER_APP_ID_HEADER, CUSTOMER_TOKEN_PATH,
    DEFAULT_TOKEN_LIFETIME, JSON_CONTENT_TYPE, REQUEST_ID_HEADER,
};
use crate::credential::{ClientIdentity, ServiceCredential};
use crate::error::{Error, Result};
use crate::headers::{header_value, new_request_id};

#[derive(Debug, Serialize)]
struct CustomerTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
}

/// Both fields are optional on the wire; a missing token is rejected after decoding.
#[derive(Debug, Deserialize)]
struct CustomerTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    /// Seconds until expiry (delta, not absolute)
    #[serde(default)]
    expires_in: Option<f64>,
}

/// Obtain a new customer token.
///
/// `issued_at` is taken from `clock` once the response has been validated.
pub async fn request_customer_token(
    transport: &dyn Transport,
    identity: &ClientIdentity,
    clock: &dyn Clock,
) -> Result<ServiceCredential> {
    exchange(transport, identity, clock)
        .await
        .map_err(into_refresh_failure)
}

async fn exchange(
    transport: &dyn Transport,
    identity: &ClientIdentity,
    clock: &dyn Clock,
) -> Result<ServiceCredential> {
    let body = serde_json::to_vec(&CustomerTokenRequest {
        client_id: &identity.client_id,
        client_secret: identity.client_secret.expose(),
        grant_type: CLIENT_CREDENTIALS_GRANT,
    })
    .map_err(|e| Error::Sdk(format!("encoding token request: {e}")))?;

    let request_id = new_request_id();
    let mut request = HttpRequest::new(Method::POST, identity.url(CUSTOMER_TOKEN_PATH));
    request
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    request.headers.insert(
        CUSTOMER_APP_ID_HEADER,
        header_value(CUSTOMER_APP_ID_HEADER, &identity.customer_app_id)?,
    );
    request.headers.insert(
        REQUEST_ID_HEADER,
        header_value(REQUEST_ID_HEADER, &request_id)?,
    );
    request.body = Some(body);

    debug!(%request_id, "requesting customer token");
    let response = transport.send(request).await?;

    if !response.is_success() {
        return Err(classify_status(response.status, &response.body));
    }

    let parsed: CustomerTokenResponse =
        serde_json::from_slice(&response.body).map_err(|e| Error::MalformedResponse {
            status: response.status,
            message: e.to_string(),
        })?;

    let token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Auth {
            status: Some(response.status),
            message: "token response did not contain an access_token".into(),
            payload: None,
        })?;

    let lifetime_millis = match parsed.expires_in {
        Some(secs) => (secs * 1000.0) as i64,
        None => DEFAULT_TOKEN_LIFETIME.as_millis() as i64,
    };

    Ok(ServiceCredential::new(
        token,
        clock.now_millis(),
        lifetime_millis,
    ))
}

/// Re-wrap any failure from the token exchange as `Error::Auth`, keeping the
/// status and payload where there was one.
fn into_refresh_failure(err: Error) -> Error {
    match err {
        Error::Auth {
            status,
            message,
            payload,
        } => Error::Auth {
            status,
            message: format!("customer token rejected: {message}"),
            payload,
        },
        Error::RateLimit {
            status,
            message,
            payload,
        }
        | Error::InvalidRequest {
            status,
            message,
            payload,
        }
        | Error::Api {
            status,
            message,
            payload,
        } => Error::Auth {
            status: Some(status),
            message: format!("token endpoint returned {status}: {message}"),
            payload,
        },
        Error::MalformedResponse { status, message } => Error::Auth {
            status: Some(status),
            message: format!("failed to decode token response: {message}"),
            payload: None,
        },
        Error::Transport(message) => {
            Error::auth(format!("network or connection error: {message}"))
        }
        Error::Sdk(message) => {
            Error::auth(format!("unexpected error during token refresh: {message}"))
        }
    }
}
