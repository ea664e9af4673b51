//! Object key derivation.
//!
//! Tenant content is stored under `__outputs/<tenant>/<path>`. Request paths
//! are joined segment by segment: empty and `.` segments are dropped and `..`
//! never climbs above the tenant root, so a key can never address another
//! tenant's namespace.

use std::fmt;

use crate::host::TenantId;

/// Fixed key-namespace segment under which all tenant content lives.
pub const OUTPUTS_PREFIX: &str = "__outputs";

/// Document served for empty paths and used as the fallback target.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Full address of an object in the shared bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build the key for `path` within `tenant`'s namespace.
    ///
    /// With `force_index` set, the request path is discarded entirely and the
    /// key points at the tenant's top-level index document.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitegate_core::{ObjectKey, TenantId};
    ///
    /// let tenant = TenantId::new("proj1");
    /// assert_eq!(ObjectKey::build(&tenant, "/", false).as_str(), "__outputs/proj1/index.html");
    /// assert_eq!(ObjectKey::build(&tenant, "/about", false).as_str(), "__outputs/proj1/about");
    /// assert_eq!(ObjectKey::build(&tenant, "/about", true).as_str(), "__outputs/proj1/index.html");
    /// ```
    #[must_use]
    pub fn build(tenant: &TenantId, path: &str, force_index: bool) -> Self {
        let relative = path.strip_prefix('/').unwrap_or(path);

        let mut segments = if force_index {
            Vec::new()
        } else {
            normalize_segments(relative)
        };
        if segments.is_empty() {
            segments.push(INDEX_DOCUMENT);
        }

        let mut key = String::with_capacity(
            OUTPUTS_PREFIX.len() + tenant.as_str().len() + relative.len() + 2,
        );
        key.push_str(OUTPUTS_PREFIX);
        key.push('/');
        key.push_str(tenant.as_str());
        for segment in segments {
            key.push('/');
            key.push_str(segment);
        }
        Self(key)
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the key.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lowercased extension of the last segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let dot = name.rfind('.')?;
        Some(name[dot + 1..].to_ascii_lowercase())
    }

    /// Whether the key already addresses an index document, in which case a
    /// fallback fetch would be redundant.
    #[must_use]
    pub fn is_index_document(&self) -> bool {
        self.file_name() == INDEX_DOCUMENT
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collapse a relative path into clean segments, clamped at its root.
fn normalize_segments(relative: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments
}
