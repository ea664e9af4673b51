//! Core content-resolution pipeline for SiteGate.
//!
//! SiteGate serves static files for many tenants out of one shared bucket.
//! A request for `proj1.example.com/about` is answered from the object
//! `__outputs/proj1/about`, falling back to `__outputs/proj1/index.html`
//! when the object does not exist.
//!
//! The pipeline is split into small pieces, leaves first:
//!
//! - [`content_type`]: extension to MIME mapping.
//! - [`key`]: [`ObjectKey`] derivation from a tenant and a request path.
//! - [`host`]: [`TenantId`] extraction from the `Host` header.
//! - [`fetch`]: [`ContentFetcher`], which normalizes [`ObjectStore`] results
//!   into a [`FetchOutcome`].
//! - [`router`]: [`TenantRouter`], the per-request fallback state machine.

pub mod config;
pub mod content_type;
pub mod error;
pub mod fetch;
pub mod host;
pub mod key;
pub mod router;
pub mod store;

pub use config::{ConfigError, GatewayConfig};
pub use error::{GatewayError, GatewayResult, HostError};
pub use fetch::{ContentFetcher, FetchOutcome};
pub use host::{TenantId, resolve_tenant};
pub use key::{INDEX_DOCUMENT, OUTPUTS_PREFIX, ObjectKey};
pub use router::{ResolvedContent, TenantRouter};
pub use store::{MemoryObjectStore, ObjectBody, ObjectStore, StoreError, StoredObject};
