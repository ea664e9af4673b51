//! Content-Type resolution.

use crate::key::ObjectKey;

/// Fallback type for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve the `Content-Type` to serve for `key`.
///
/// A non-empty type declared by the backend is trusted as-is. Otherwise the
/// type is derived from the key's lowercased extension.
#[must_use]
pub fn resolve(declared: Option<&str>, key: &ObjectKey) -> String {
    match declared {
        Some(declared) if !declared.is_empty() => declared.to_owned(),
        _ => from_key(key).to_owned(),
    }
}

/// Derive the MIME type from the key's extension alone.
#[must_use]
pub fn from_key(key: &ObjectKey) -> &'static str {
    key.extension().map_or(OCTET_STREAM, |ext| from_extension(&ext))
}

/// Map a lowercase extension (without the dot) to its MIME type.
#[must_use]
pub fn from_extension(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        _ => OCTET_STREAM,
    }
}
