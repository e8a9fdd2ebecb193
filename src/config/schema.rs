//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files and
//! can equally be built in code with `Default` plus the `with_*` helpers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 1 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

/// 1 MiB.
pub const DEFAULT_MAX_JSON_BYTES: u64 = 1024 * 1024;

/// Root configuration for a service embedding the toolkit.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Policy for multipart uploads.
    pub upload: UploadPolicy,

    /// Policy for JSON request bodies.
    pub json: JsonPolicy,

    /// Where uploads land and downloads are served from.
    pub storage: StorageConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Upload pipeline policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UploadPolicy {
    /// Maximum total request body size in bytes.
    pub max_upload_bytes: u64,

    /// Permitted sniffed MIME types. Empty allows everything.
    pub allowed_content_types: Vec<String>,

    /// Replace client file names with random ones (extension preserved).
    pub rename_files: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_content_types: Vec::new(),
            rename_files: true,
        }
    }
}

impl UploadPolicy {
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rename(mut self, rename: bool) -> Self {
        self.rename_files = rename;
        self
    }

    /// Case-insensitive exact match against the allow-list.
    pub fn permits(&self, content_type: &str) -> bool {
        self.allowed_content_types.is_empty()
            || self
                .allowed_content_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

/// JSON decoder policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JsonPolicy {
    /// Maximum JSON body size in bytes.
    pub max_json_bytes: u64,

    /// Accept keys the target type does not declare.
    pub allow_unknown_fields: bool,
}

impl Default for JsonPolicy {
    fn default() -> Self {
        Self {
            max_json_bytes: DEFAULT_MAX_JSON_BYTES,
            allow_unknown_fields: false,
        }
    }
}

impl JsonPolicy {
    pub fn with_max_json_bytes(mut self, max: u64) -> Self {
        self.max_json_bytes = max;
        self
    }

    pub fn with_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }
}

/// Storage locations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Destination directory for uploads.
    pub upload_dir: PathBuf,

    /// Directory static downloads are served from.
    pub download_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            download_dir: PathBuf::from("./static"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToolkitConfig::default();
        assert_eq!(config.upload.max_upload_bytes, 1024 * 1024 * 1024);
        assert!(config.upload.allowed_content_types.is_empty());
        assert!(config.upload.rename_files);
        assert_eq!(config.json.max_json_bytes, 1024 * 1024);
        assert!(!config.json.allow_unknown_fields);
    }

    #[test]
    fn test_permits() {
        let open = UploadPolicy::default();
        assert!(open.permits("application/x-anything"));

        let images = UploadPolicy::default().with_allowed_types(["image/jpeg", "IMAGE/PNG"]);
        assert!(images.permits("image/png"));
        assert!(images.permits("Image/JPEG"));
        assert!(!images.permits("image/gif"));
        assert!(!images.permits("image/png; charset=utf-8"));
    }
}
