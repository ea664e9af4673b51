//! HTTP front end for SiteGate.
//!
//! - **Service** ([`service`]): [`SiteHttpService`], the hyper `Service`
//!   that turns a request's host and path into a response.
//! - **Response** ([`response`]): status mapping and response builders.
//! - **Body** ([`body`]): [`GatewayBody`], buffered or streamed from the
//!   object store.
//! - **Server** ([`server`]): the accept loop with graceful shutdown.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> SiteHttpService (hyper Service)
//!     -> Health check interception
//!     -> Host / path extraction, percent-decoding
//!     -> TenantRouter::route (sitegate-core)
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response (streamed body)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sitegate_core::{GatewayConfig, MemoryObjectStore, TenantRouter};
//! use sitegate_http::SiteHttpService;
//!
//! let config = GatewayConfig::builder()
//!     .bucket_name("sites".into())
//!     .base_domain("example.com".into())
//!     .build();
//! let router = TenantRouter::new(Arc::new(config), Arc::new(MemoryObjectStore::new()));
//! let service = SiteHttpService::new(router);
//! // Pass `service` to `sitegate_http::server::serve`.
//! ```

pub mod body;
pub mod response;
pub mod server;
pub mod service;

pub use body::GatewayBody;
pub use server::serve;
pub use service::SiteHttpService;
