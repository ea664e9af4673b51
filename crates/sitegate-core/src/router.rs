//! Per-request routing: host to tenant to key to object.
//!
//! [`TenantRouter::route`] runs a small state machine for every request:
//!
//! ```text
//! Start ──► PrimaryFetch ──Found──────────────────────────► Serve
//!               │
//!               ├─NotFound, eligible──► FallbackFetch ─Found─► Serve
//!               │                            │
//!               ├─NotFound, not eligible─────┴─NotFound──► NotFoundFinal
//!               │                            │
//!               └─UpstreamError──────────────┴─UpstreamError─► UpstreamFailure
//! ```
//!
//! A primary key is eligible for fallback unless it already addresses an
//! index document. The fallback key is always the tenant's top-level
//! `index.html`; the request path is not preserved. Fetches are strictly
//! sequential and at most two are issued per request.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::content_type;
use crate::error::{GatewayError, GatewayResult};
use crate::fetch::{ContentFetcher, FetchOutcome};
use crate::host::{TenantId, resolve_tenant};
use crate::key::ObjectKey;
use crate::store::{ObjectBody, ObjectStore};

/// Content ready to be streamed to the client.
pub struct ResolvedContent {
    /// Tenant the request was resolved to.
    pub tenant: TenantId,
    /// Key of the object actually served.
    pub key: ObjectKey,
    /// `Content-Type` to send.
    pub content_type: String,
    /// Object size, if known.
    pub content_length: Option<u64>,
    /// Whether the object came from the index fallback.
    pub from_fallback: bool,
    /// The object bytes.
    pub body: ObjectBody,
}

impl std::fmt::Debug for ResolvedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedContent")
            .field("tenant", &self.tenant)
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("from_fallback", &self.from_fallback)
            .finish_non_exhaustive()
    }
}

/// Which key variant is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Primary,
    Fallback,
}

/// Routes requests to tenant content.
///
/// Cheap to clone; configuration and the backend are shared.
#[derive(Debug, Clone)]
pub struct TenantRouter {
    config: Arc<GatewayConfig>,
    fetcher: ContentFetcher,
}

impl TenantRouter {
    /// Create a router over `store`.
    #[must_use]
    pub fn new(config: Arc<GatewayConfig>, store: Arc<dyn ObjectStore>) -> Self {
        let fetcher = ContentFetcher::new(store, config.fetch_timeout());
        Self { config, fetcher }
    }

    /// Resolve `host` and `path` to an object ready to stream.
    ///
    /// `path` must already be percent-decoded.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::BadRequest`] if the host is not a tenant subdomain.
    /// - [`GatewayError::NotFound`] if neither the primary nor an eligible
    ///   fallback object exists.
    /// - [`GatewayError::Upstream`] if the backend fails.
    pub async fn route(&self, host: &str, path: &str) -> GatewayResult<ResolvedContent> {
        let tenant = resolve_tenant(host, &self.config.base_domain)?;
        let primary = ObjectKey::build(&tenant, path, false);

        let mut stage = Stage::Primary;
        let mut key = primary.clone();

        loop {
            match self.fetcher.fetch(&key).await {
                FetchOutcome::Found(object) => {
                    let from_fallback = stage == Stage::Fallback;
                    if from_fallback {
                        info!(tenant = %tenant, primary = %primary, key = %key, "serving index fallback");
                    }
                    let content_type = content_type::resolve(object.content_type.as_deref(), &key);
                    return Ok(ResolvedContent {
                        tenant,
                        key,
                        content_type,
                        content_length: object.content_length,
                        from_fallback,
                        body: object.body,
                    });
                }
                FetchOutcome::NotFound => {
                    if stage == Stage::Primary && !primary.is_index_document() {
                        debug!(tenant = %tenant, primary = %primary, "primary miss, trying index fallback");
                        stage = Stage::Fallback;
                        key = ObjectKey::build(&tenant, path, true);
                        continue;
                    }
                    info!(tenant = %tenant, key = %primary, "object not found after all attempts");
                    return Err(GatewayError::NotFound { key: primary });
                }
                FetchOutcome::UpstreamError(message) => {
                    return Err(GatewayError::Upstream { key, message });
                }
            }
        }
    }
}
