//! HTTP input-handling toolkit: bounded multipart uploads, strict JSON
//! decoding, JSON responses and a few string and filesystem helpers.

pub mod config;
pub mod error;
pub mod fs;
pub mod json;
pub mod observability;
pub mod security;
pub mod text;
pub mod upload;

pub use config::schema::{JsonPolicy, ToolkitConfig, UploadPolicy};
pub use error::{ToolkitError, ToolkitResult};
pub use json::{decode_json, read_json, write_json, JsonResponse, RemotePush, StrictJson};
pub use upload::{UploadedFile, Uploader};
