//! Static file downloads.
//!
//! # Responsibilities
//! - Stream a file as an attachment with a caller-chosen display name
//! - Set `Content-Type`, `Content-Length` and `Content-Disposition`
//!
//! # Design Decisions
//! - Content type comes from the extension, falling back to sniffing
//! - The display name is caller-controlled: quotes and backslashes are
//!   escaped, and names that cannot be a header value are rejected
//! - No range or conditional request handling; the host router owns that

use std::io::ErrorKind;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::{ToolkitError, ToolkitResult};
use crate::security::filename::sanitize_file_name;
use crate::security::sniff::sniff_reader;

/// Stream the file at `path` as an attachment named `display_name`.
pub async fn download_static_file(
    path: impl AsRef<Path>,
    display_name: &str,
) -> ToolkitResult<Response> {
    let path = path.as_ref();
    let disposition = content_disposition(display_name)?;

    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ToolkitError::FileNotFound),
        Err(e) => return Err(e.into()),
    };
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(ToolkitError::FileNotFound);
    }

    let content_type = match mime_guess::from_path(path).first_raw() {
        Some(guessed) => guessed,
        None => sniff_reader(&mut file).await?,
    };

    tracing::debug!(
        path = %path.display(),
        content_type,
        length = metadata.len(),
        "Serving static download"
    );

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// Serve `file_name` from inside `dir`. Directory components in `file_name`
/// are discarded so the lookup cannot leave `dir`.
pub async fn download_from_dir(
    dir: impl AsRef<Path>,
    file_name: &str,
    display_name: &str,
) -> ToolkitResult<Response> {
    let file_name = sanitize_file_name(file_name)?;
    download_static_file(dir.as_ref().join(file_name), display_name).await
}

fn content_disposition(display_name: &str) -> ToolkitResult<HeaderValue> {
    let escaped = display_name.replace('\\', "\\\\").replace('"', "\\\"");
    let value = format!("attachment; filename=\"{escaped}\"");
    HeaderValue::from_bytes(value.as_bytes()).map_err(|_| ToolkitError::InvalidFileName)
}
