//! Client-supplied file name handling.

use std::path::Path;

use crate::error::{ToolkitError, ToolkitResult};

const MAX_EXTENSION_LEN: usize = 16;

/// Reduce a client-supplied name to its final path component.
///
/// Directory segments from either separator style are dropped. Names that
/// are empty, `.` or `..`, or that contain control characters are rejected.
pub fn sanitize_file_name(name: &str) -> ToolkitResult<String> {
    let base = name
        .trim()
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." || base.chars().any(char::is_control) {
        tracing::warn!(name = ?name, "Rejected unusable client file name");
        return Err(ToolkitError::InvalidFileName);
    }

    Ok(base.to_string())
}

/// Extension of `name` including the leading dot, e.g. `.png`.
///
/// Only short alphanumeric extensions are carried over to generated names.
pub fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(format!(".{ext}"))
}
