//! Response construction for served content, errors, and the health check.
//!
//! Error bodies are plain text and carry only
//! [`GatewayError::public_message`]; object keys and backend diagnostics
//! stay in the logs.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use sitegate_core::{GatewayError, ResolvedContent, content_type};

use crate::body::GatewayBody;

/// Path of the built-in health endpoint.
pub const HEALTH_PATH: &str = "/_sitegate/health";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// HTTP status for a gateway failure.
#[must_use]
pub fn status_for(err: &GatewayError) -> http::StatusCode {
    match err {
        GatewayError::BadRequest(_) => http::StatusCode::BAD_REQUEST,
        GatewayError::NotFound { .. } => http::StatusCode::NOT_FOUND,
        GatewayError::Upstream { .. } | GatewayError::Stream { .. } => {
            http::StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Convert a [`GatewayError`] into a plain-text HTTP error response.
#[must_use]
pub fn error_to_response(err: &GatewayError) -> http::Response<GatewayBody> {
    let mut response =
        http::Response::new(GatewayBody::from_string(format!("{}\n", err.public_message())));
    *response.status_mut() = status_for(err);

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(PLAIN_TEXT));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// Build the `200 OK` response that streams resolved content.
///
/// A content type the backend declared but which is not a valid header value
/// is replaced by the type derived from the key.
#[must_use]
pub fn content_response(content: ResolvedContent, request_id: &str) -> http::Response<GatewayBody> {
    let type_header = HeaderValue::from_str(&content.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(content_type::from_key(&content.key)));
    let content_length = content.content_length;

    let mut response = http::Response::new(GatewayBody::streaming(
        content.key,
        content.body,
        content_length,
        request_id,
    ));

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, type_header);
    if let Some(len) = content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}

/// Check if the request is a health check.
#[must_use]
pub fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_PATH
}

/// Produce a health check response.
#[must_use]
pub fn health_check_response() -> http::Response<GatewayBody> {
    let mut response = http::Response::new(GatewayBody::from_string(
        r#"{"status":"running","service":"sitegate"}"#,
    ));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
