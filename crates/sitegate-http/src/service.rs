//! The gateway HTTP service implementing hyper's `Service` trait.
//!
//! [`SiteHttpService`] handles, in order:
//!
//! 1. Health check interception (`GET /_sitegate/health`)
//! 2. Host and path extraction
//! 3. Content resolution via [`TenantRouter`]
//! 4. Error response formatting
//! 5. Common response headers (`x-request-id`, `Server`)
//!
//! Every method is served the same way; the gateway has no write operations.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use hyper::service::Service;
use percent_encoding::percent_decode_str;
use sitegate_core::{GatewayError, HostError, TenantRouter};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::body::GatewayBody;
use crate::response::{content_response, error_to_response, health_check_response, is_health_check};

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "sitegate";

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The gateway HTTP service.
///
/// Cheap to clone: one clone is made per connection.
#[derive(Debug, Clone)]
pub struct SiteHttpService {
    router: TenantRouter,
    peer: Option<SocketAddr>,
}

impl SiteHttpService {
    /// Create a service that routes through `router`.
    #[must_use]
    pub fn new(router: TenantRouter) -> Self {
        Self { router, peer: None }
    }

    /// Copy of this service that tags its logs with the connection's peer address.
    #[must_use]
    pub fn with_peer(&self, peer: SocketAddr) -> Self {
        Self {
            router: self.router.clone(),
            peer: Some(peer),
        }
    }
}

impl<B> Service<http::Request<B>> for SiteHttpService {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let router = self.router.clone();
        let peer = self.peer;

        // Only the head is needed; the request body is never read.
        let method = req.method().clone();
        let host = request_host(&req).map(ToOwned::to_owned);
        let raw_path = req.uri().path().to_owned();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();

            let response = process_request(
                &router,
                &method,
                host.as_deref(),
                &raw_path,
                peer,
                &request_id,
            )
            .await;

            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Run one request through the resolution pipeline.
async fn process_request(
    router: &TenantRouter,
    method: &http::Method,
    host: Option<&str>,
    raw_path: &str,
    peer: Option<SocketAddr>,
    request_id: &str,
) -> http::Response<GatewayBody> {
    if is_health_check(method, raw_path) {
        debug!(request_id, "health check");
        return health_check_response();
    }

    let path = decode_path(raw_path);
    info!(
        %method,
        host = host.unwrap_or_default(),
        path = %path,
        peer = ?peer,
        request_id,
        "received request"
    );

    let result = match host {
        Some(host) => router.route(host, &path).await,
        None => Err(GatewayError::BadRequest(HostError::Missing)),
    };

    match result {
        Ok(content) => {
            debug!(
                tenant = %content.tenant,
                key = %content.key,
                content_type = %content.content_type,
                fallback = content.from_fallback,
                request_id,
                "streaming object"
            );
            content_response(content, request_id)
        }
        Err(err) => {
            log_failure(&err, request_id);
            error_to_response(&err)
        }
    }
}

fn log_failure(err: &GatewayError, request_id: &str) {
    match err {
        GatewayError::BadRequest(_) => warn!(error = %err, request_id, "rejected request"),
        GatewayError::NotFound { .. } => info!(error = %err, request_id, "object not found"),
        GatewayError::Upstream { .. } | GatewayError::Stream { .. } => {
            error!(error = %err, request_id, "failed to fetch object");
        }
    }
}

/// Host the client addressed: the `Host` header, else the URI authority
/// (HTTP/2 sends `:authority` instead of `Host`).
fn request_host<B>(req: &http::Request<B>) -> Option<&str> {
    req.headers()
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(http::uri::Authority::as_str))
        .filter(|h| !h.is_empty())
}

/// Percent-decode the request path.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<GatewayBody>,
    request_id: &str,
) -> http::Response<GatewayBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static(SERVER_NAME),
    );

    response
}
