//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0)
//! - Reject malformed MIME types in the allow-list
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ToolkitConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::ToolkitConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ToolkitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upload.max_upload_bytes == 0 {
        errors.push(ValidationError::new("upload.max_upload_bytes", "must be greater than zero"));
    }

    for (i, content_type) in config.upload.allowed_content_types.iter().enumerate() {
        if !is_mime_like(content_type) {
            errors.push(ValidationError::new(
                format!("upload.allowed_content_types[{i}]"),
                format!("{content_type:?} is not a type/subtype MIME string"),
            ));
        }
    }

    if config.json.max_json_bytes == 0 {
        errors.push(ValidationError::new("json.max_json_bytes", "must be greater than zero"));
    }

    if config.storage.upload_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("storage.upload_dir", "must not be empty"));
    }

    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::new("observability.log_level", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_mime_like(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    match essence.split_once('/') {
        Some((kind, subtype)) => {
            let token = |s: &str| {
                !s.is_empty()
                    && s.chars()
                        .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
            };
            token(kind) && token(subtype)
        }
        None => false,
    }
}
