//! Error taxonomy shared by every toolkit operation.
//!
//! # Design Decisions
//! - Display strings are safe to show to API clients; they never embed the
//!   text of an underlying parser, filesystem or transport error
//! - Sources stay reachable via `std::error::Error::source` for logging
//! - Nothing here is retried; retry policy belongs to the caller

use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::json::response::JsonResponse;

/// Errors produced by the upload pipeline, the JSON codec and the helpers.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// Request or JSON body exceeded the configured byte cap.
    #[error("body must not be larger than {limit} bytes")]
    BodyTooLarge { limit: u64 },

    /// Sniffed MIME type is not on the allow-list.
    #[error("uploaded file type {content_type} is not permitted")]
    DisallowedFileType { content_type: String },

    /// Destination directory could not be created.
    #[error("upload destination could not be prepared")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Underlying read or write failure.
    #[error("failed to read or store request data")]
    Io(#[from] io::Error),

    /// `upload_one_file` found no file parts.
    #[error("no files were uploaded")]
    NoFilesUploaded,

    /// Body is not a parsable multipart form.
    #[error("request body is not a valid multipart form")]
    MalformedMultipart,

    /// Destination name is already taken; existing files are never replaced.
    #[error("a file with that name already exists")]
    FileExists { name: String },

    /// Client-supplied file name cannot be used safely.
    #[error("file name is not permitted")]
    InvalidFileName,

    #[error("body must not be empty")]
    EmptyBody,

    /// Malformed JSON.
    #[error("{}", describe_syntax(.offset))]
    Syntax { offset: Option<u64> },

    /// JSON value does not match the target field type.
    #[error("{}", describe_mismatch(.field, .offset))]
    TypeMismatch {
        field: Option<String>,
        offset: Option<u64>,
    },

    #[error("body is missing required key {field:?}")]
    MissingField { field: String },

    /// Strict mode rejected a key the target does not declare.
    #[error("body contains unknown key {field:?}")]
    UnknownField { field: String },

    #[error("body must contain only one JSON value")]
    MultipleJsonValues,

    /// Outbound or response serialization failed.
    #[error("failed to encode JSON payload")]
    Marshal(#[source] serde_json::Error),

    #[error("remote URL is not valid")]
    InvalidUrl(#[from] url::ParseError),

    /// Outbound push transport error.
    #[error("request to remote service failed")]
    RemoteRequest(#[source] reqwest::Error),

    #[error("requested file was not found")]
    FileNotFound,

    /// Slug source string was empty.
    #[error("empty string is not permitted")]
    EmptyInput,

    #[error("slug is empty after removing unsupported characters")]
    EmptySlug,
}

/// Result type for toolkit operations.
pub type ToolkitResult<T> = Result<T, ToolkitError>;

fn describe_syntax(offset: &Option<u64>) -> String {
    match offset {
        Some(offset) => format!("body contains badly formed JSON at character {offset}"),
        None => "body contains badly formed JSON".to_string(),
    }
}

fn describe_mismatch(field: &Option<String>, offset: &Option<u64>) -> String {
    match (field, offset) {
        (Some(field), _) => format!("body contains incorrect JSON type for field {field:?}"),
        (None, Some(offset)) => format!("body contains incorrect JSON type at character {offset}"),
        (None, None) => "body contains incorrect JSON type".to_string(),
    }
}

impl ToolkitError {
    /// HTTP status that best describes this error to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DisallowedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::FileNotFound => StatusCode::NOT_FOUND,
            Self::FileExists { .. } => StatusCode::CONFLICT,
            Self::DirectoryCreateFailed { .. } | Self::Io(_) | Self::Marshal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::RemoteRequest(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short machine-friendly label, used as a metrics dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::BodyTooLarge { .. } => "body_too_large",
            Self::DisallowedFileType { .. } => "disallowed_file_type",
            Self::DirectoryCreateFailed { .. } => "directory_create_failed",
            Self::Io(_) => "io",
            Self::NoFilesUploaded => "no_files_uploaded",
            Self::MalformedMultipart => "malformed_multipart",
            Self::FileExists { .. } => "file_exists",
            Self::InvalidFileName => "invalid_file_name",
            Self::EmptyBody => "empty_body",
            Self::Syntax { .. } => "syntax",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::MissingField { .. } => "missing_field",
            Self::UnknownField { .. } => "unknown_field",
            Self::MultipleJsonValues => "multiple_json_values",
            Self::Marshal(_) => "marshal",
            Self::InvalidUrl(_) => "invalid_url",
            Self::RemoteRequest(_) => "remote_request",
            Self::FileNotFound => "file_not_found",
            Self::EmptyInput => "empty_input",
            Self::EmptySlug => "empty_slug",
        }
    }
}

impl IntoResponse for ToolkitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }
        JsonResponse::error(self.to_string()).into_status_response(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolkitError::BodyTooLarge { limit: 5 };
        assert_eq!(err.to_string(), "body must not be larger than 5 bytes");

        let err = ToolkitError::Syntax { offset: Some(8) };
        assert_eq!(err.to_string(), "body contains badly formed JSON at character 8");

        let err = ToolkitError::TypeMismatch {
            field: Some("foo".into()),
            offset: Some(9),
        };
        assert_eq!(err.to_string(), "body contains incorrect JSON type for field \"foo\"");

        let err = ToolkitError::TypeMismatch { field: None, offset: Some(3) };
        assert_eq!(err.to_string(), "body contains incorrect JSON type at character 3");

        let err = ToolkitError::UnknownField { field: "fooo".into() };
        assert_eq!(err.to_string(), "body contains unknown key \"fooo\"");
    }

    #[test]
    fn test_io_error_is_not_leaked() {
        let err = ToolkitError::from(io::Error::other("/secret/path: permission denied"));
        assert!(!err.to_string().contains("secret"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ToolkitError::BodyTooLarge { limit: 1 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ToolkitError::DisallowedFileType { content_type: "image/png".into() }.status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(ToolkitError::EmptyBody.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ToolkitError::FileNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ToolkitError::FileExists { name: "a.png".into() }.status_code(),
            StatusCode::CONFLICT
        );
    }
}
