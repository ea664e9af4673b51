//! Tenant resolution from the request host.
//!
//! Tenants live on subdomains of a single base domain. For the base domain
//! `example.com`, the host `proj1.example.com:8443` belongs to tenant `proj1`.
//! Additional subdomain levels are allowed; the left-most label always wins.

use std::fmt;

use crate::error::HostError;

/// Identifier of a tenant, the left-most label of its host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    /// Wrap a tenant label. No charset or length validation is performed.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the tenant id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the tenant addressed by `host` under `base_domain`.
///
/// # Errors
///
/// Returns a [`HostError`] when the host is the bare base domain, is not a
/// subdomain of it, or has an empty first label.
pub fn resolve_tenant(host: &str, base_domain: &str) -> Result<TenantId, HostError> {
    let host = host.split(':').next().unwrap_or(host);

    if host == base_domain {
        return Err(HostError::RootDomain {
            host: host.to_owned(),
            base_domain: base_domain.to_owned(),
        });
    }

    let suffix = format!(".{base_domain}");
    if host.ends_with(&suffix) {
        let label = host.split('.').next().unwrap_or_default();
        if label.is_empty() {
            return Err(HostError::EmptyLabel {
                host: host.to_owned(),
            });
        }
        return Ok(TenantId::new(label));
    }

    Err(HostError::Foreign {
        host: host.to_owned(),
        base_domain: base_domain.to_owned(),
    })
}
