//! Responses produced by the gate itself.

use accessgate_iam::Rejection;
use http::header::{CONTENT_TYPE, HeaderValue};

use crate::body::GateResponseBody;

/// Header carrying the per-request id on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Turn a gate rejection into a plain-text response with a generic body.
#[must_use]
pub fn rejection_to_response(rejection: Rejection) -> http::Response<GateResponseBody> {
    plain_text(rejection.status(), rejection.to_string())
}

/// 500 response for failures outside the gate pipeline.
#[must_use]
pub fn internal_error_response(message: &'static str) -> http::Response<GateResponseBody> {
    plain_text(http::StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Health probe response.
#[must_use]
pub fn health_check_response() -> http::Response<GateResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(GateResponseBody::from_string(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}

/// Stamp the request id onto a response.
#[must_use]
pub fn with_request_id(
    mut response: http::Response<GateResponseBody>,
    request_id: &str,
) -> http::Response<GateResponseBody> {
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, hv);
    }
    response
}

fn plain_text(
    status: http::StatusCode,
    message: impl Into<String>,
) -> http::Response<GateResponseBody> {
    let mut response = http::Response::new(GateResponseBody::from_string(message));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
