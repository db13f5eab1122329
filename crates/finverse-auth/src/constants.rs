//! Finverse API constants

use std::time::Duration;

/// Default API host (sandbox environment)
pub const SANDBOX_BASE_URL: &str = "https://api.sandbox.finverse.net";

/// Client-credentials grant for the customer token
pub const CUSTOMER_TOKEN_PATH: &str = "/auth/customer/token";

/// Authorization-code exchange for the user token
pub const AUTHORIZATION_TOKEN_PATH: &str = "/auth/token";

pub const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";
pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Application identity header, sent on every authenticated call
pub const CUSTOMER_APP_ID_HEADER: &str = "x-customer-app-id";

/// Per-request correlation identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Lifetime assumed when the token response omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Customer tokens are renewed this long before they expire
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(300);
