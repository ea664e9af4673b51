//! Error taxonomy for the content-resolution pipeline.
//!
//! Every failure a request can hit is one of the [`GatewayError`] variants.
//! The HTTP layer decides the status code; this module only decides what
//! went wrong and what may be shown to the client.

use crate::key::ObjectKey;

/// Why a `Host` header could not be turned into a tenant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The request carried no host at all.
    #[error("missing Host header")]
    Missing,

    /// The host is the bare base domain.
    #[error("root domain '{host}' hit, expected a subdomain '*.{base_domain}'")]
    RootDomain {
        /// Host with the port stripped.
        host: String,
        /// Configured base domain.
        base_domain: String,
    },

    /// The host matched the base domain suffix but its first label is empty.
    #[error("could not extract tenant from host: {host}")]
    EmptyLabel {
        /// Host with the port stripped.
        host: String,
    },

    /// The host is not a subdomain of the base domain.
    #[error("host '{host}' does not match expected subdomain format '*.{base_domain}'")]
    Foreign {
        /// Host with the port stripped.
        host: String,
        /// Configured base domain.
        base_domain: String,
    },
}

/// Failure of a single gateway request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The host does not resolve to a tenant. Never retried.
    #[error("bad request: {0}")]
    BadRequest(#[from] HostError),

    /// Neither the primary key nor an eligible fallback key exists.
    #[error("object not found: {key}")]
    NotFound {
        /// The primary key of the request.
        key: ObjectKey,
    },

    /// The storage backend failed with something other than not-found.
    #[error("upstream error fetching {key}: {message}")]
    Upstream {
        /// The key whose fetch failed.
        key: ObjectKey,
        /// Backend diagnostic, for the operational log only.
        message: String,
    },

    /// Copying the object body failed after the response head was sent.
    #[error("stream error serving {key}: {source}")]
    Stream {
        /// The key being streamed.
        key: ObjectKey,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Text that is safe to show to the client.
    ///
    /// Object keys and backend diagnostics never appear here.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(reason) => format!("Bad Request: {reason}"),
            Self::NotFound { .. } => "Not Found".to_owned(),
            Self::Upstream { .. } | Self::Stream { .. } => "Internal Server Error".to_owned(),
        }
    }
}

/// Convenience result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
