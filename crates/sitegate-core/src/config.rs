//! Gateway configuration.
//!
//! Provides [`GatewayConfig`], built once at startup and shared read-only by
//! every request. Values are loaded from environment variables; the bucket
//! and base domain are mandatory and startup fails without them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Environment variable holding the bucket name.
pub const BUCKET_NAME_VAR: &str = "S3_BUCKET_NAME";
/// Environment variable holding the base domain.
pub const BASE_DOMAIN_VAR: &str = "BASE_DOMAIN";

const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A mandatory variable is unset or empty.
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// SiteGate configuration.
///
/// # Examples
///
/// ```
/// use sitegate_core::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .bucket_name("sites".into())
///     .base_domain("example.com".into())
///     .build();
/// assert_eq!(config.listen_addr(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bucket holding every tenant's content.
    pub bucket_name: String,

    /// Domain under which tenant subdomains live (e.g. `example.com`).
    pub base_domain: String,

    /// Interface to bind.
    #[builder(default = String::from(DEFAULT_LISTEN_HOST))]
    pub listen_host: String,

    /// Port to bind.
    #[builder(default = DEFAULT_PORT)]
    pub port: u16,

    /// Endpoint override for S3-compatible backends.
    #[builder(default)]
    pub s3_endpoint_url: Option<String>,

    /// Use path-style bucket addressing.
    #[builder(default = false)]
    pub s3_force_path_style: bool,

    /// Upper bound on a single backend fetch, in seconds.
    #[builder(default = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"sitegate_core=debug"`).
    #[builder(default = String::from(DEFAULT_LOG_LEVEL))]
    pub log_level: String,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_BUCKET_NAME` | *(required)* |
    /// | `BASE_DOMAIN` | *(required)* |
    /// | `LISTEN_HOST` | `0.0.0.0` |
    /// | `PORT` | `8080` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `FETCH_TIMEOUT_SECS` | `30` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let bucket_name = get(BUCKET_NAME_VAR).ok_or(ConfigError::Missing(BUCKET_NAME_VAR))?;
        let base_domain = get(BASE_DOMAIN_VAR).ok_or(ConfigError::Missing(BASE_DOMAIN_VAR))?;

        let mut config = Self::builder()
            .bucket_name(bucket_name)
            .base_domain(base_domain)
            .build();

        if let Some(v) = get("LISTEN_HOST") {
            config.listen_host = v;
        }
        if let Some(v) = get("PORT") {
            config.port = v.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: v.clone(),
                reason: "expected a port number",
            })?;
        }
        if let Some(v) = get("S3_ENDPOINT_URL") {
            config.s3_endpoint_url = Some(v);
        }
        if let Some(v) = get("S3_FORCE_PATH_STYLE") {
            config.s3_force_path_style = parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                var: "S3_FORCE_PATH_STYLE",
                value: v.clone(),
                reason: "expected true, false, 1 or 0",
            })?;
        }
        if let Some(v) = get("FETCH_TIMEOUT_SECS") {
            config.fetch_timeout_secs = match v.parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "FETCH_TIMEOUT_SECS",
                        value: v,
                        reason: "expected a positive number of seconds",
                    });
                }
            };
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// Socket address string to bind, e.g. `0.0.0.0:8080`.
    ///
    /// IPv6 hosts are bracketed (`[::]:8080`).
    #[must_use]
    pub fn listen_addr(&self) -> String {
        if self.listen_host.contains(':') && !self.listen_host.starts_with('[') {
            format!("[{}]:{}", self.listen_host, self.port)
        } else {
            format!("{}:{}", self.listen_host, self.port)
        }
    }

    /// Per-fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Parse a boolean flag: `"1"`/`"true"` or `"0"`/`"false"` (case-insensitive).
fn parse_bool(value: &str) -> Option<bool> {
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
