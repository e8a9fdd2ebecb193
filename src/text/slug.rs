//! URL slug generation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ToolkitError, ToolkitResult};

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    // ASCII only: `\d` would also match non-ASCII digits.
    Regex::new(r"[^a-z0-9]+").expect("valid slug pattern")
});

/// Lowercase `s` and collapse every run of non-alphanumeric characters into
/// a single `-`, trimming dashes from both ends.
pub fn slugify(s: &str) -> ToolkitResult<String> {
    if s.is_empty() {
        return Err(ToolkitError::EmptyInput);
    }

    let lowered = s.to_lowercase();
    let slug = NON_SLUG.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        return Err(ToolkitError::EmptySlug);
    }

    Ok(slug.to_string())
}
