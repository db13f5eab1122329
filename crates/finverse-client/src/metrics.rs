//! Request metrics
//!
//! Emitted through the `metrics` facade; the SDK installs no recorder, so these
//! are no-ops unless the host application installs one.
//!
//! - `finverse_requests_total` (counter): labels `method`, `status`
//! - `finverse_request_errors_total` (counter): label `kind`

use finverse_auth::ErrorKind;
use transport::Method;

/// Record a call that produced an HTTP response, whatever its status.
pub fn record_request(method: &Method, status: u16) {
    metrics::counter!(
        "finverse_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a failed call by error kind.
pub fn record_error(kind: ErrorKind) {
    metrics::counter!("finverse_request_errors_total", "kind" => kind.label()).increment(1);
}
