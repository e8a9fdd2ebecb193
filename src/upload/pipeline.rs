//! Per-request multipart processing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use bytes::BytesMut;
use multer::{Field, Multipart};
use serde::{Deserialize, Serialize};
use tempfile::{NamedTempFile, PathPersistError};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::UploadPolicy;
use crate::error::{ToolkitError, ToolkitResult};
use crate::fs::create_dir_if_not_exist;
use crate::observability::metrics;
use crate::security::filename::{extension_of, sanitize_file_name};
use crate::security::limits::{check_content_length, classify_stream_error, BodyLimit};
use crate::security::sniff::{sniff, SNIFF_LEN};
use crate::text::random_string;

/// Length of generated file names, excluding the extension.
const GENERATED_NAME_LEN: usize = 25;

/// Permissions for stored uploads.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// One stored file part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Name of the file inside the destination directory.
    pub assigned_name: String,
    /// Name the client sent. Untrusted; never used to build a path.
    pub original_name: String,
    /// Bytes written to storage.
    pub byte_size: u64,
    /// MIME type sniffed from the leading bytes.
    pub content_type: String,
}

/// Files stored by one call. Dropping an uncommitted batch removes them, so
/// an error return and a cancelled future clean up the same way.
struct Batch {
    paths: Vec<PathBuf>,
    files: Vec<UploadedFile>,
    committed: bool,
}

impl Batch {
    fn new() -> Self {
        Self {
            paths: Vec::new(),
            files: Vec::new(),
            committed: false,
        }
    }

    fn push(&mut self, path: PathBuf, file: UploadedFile) {
        self.paths.push(path);
        self.files.push(file);
    }

    fn len(&self) -> usize {
        self.files.len()
    }

    fn commit(mut self) -> Vec<UploadedFile> {
        self.committed = true;
        std::mem::take(&mut self.files)
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in &self.paths {
            if let Err(err) = std::fs::remove_file(path) {
                if err.kind() != ErrorKind::NotFound {
                    tracing::error!(path = %path.display(), error = %err, "Failed to roll back upload");
                }
            }
        }
    }
}

/// Stores multipart file parts under an [`UploadPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Uploader {
    policy: UploadPolicy,
}

impl Uploader {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Store every file part of `request` in `dir`, creating it if needed.
    ///
    /// Parts without a file name are skipped. Existing files are never
    /// replaced. If any part fails, or the returned future is dropped before
    /// completing, files stored earlier in the same call are removed.
    pub async fn upload_files(
        &self,
        request: Request,
        dir: impl AsRef<Path>,
    ) -> ToolkitResult<Vec<UploadedFile>> {
        let dir = dir.as_ref();
        let mut batch = Batch::new();

        match self.receive(request, dir, &mut batch).await {
            Ok(()) => {
                let files = batch.commit();
                for file in &files {
                    metrics::record_uploaded_file(file.byte_size);
                }
                tracing::debug!(
                    dir = %dir.display(),
                    files = files.len(),
                    "Upload batch stored"
                );
                Ok(files)
            }
            Err(err) => {
                let removed = batch.len();
                drop(batch);
                tracing::warn!(
                    dir = %dir.display(),
                    reason = err.reason(),
                    removed,
                    "Upload batch rejected"
                );
                metrics::record_upload_rejection(&err);
                Err(err)
            }
        }
    }

    /// Store the parts of `request` and return the first one.
    ///
    /// Every part is stored, as with [`Uploader::upload_files`].
    pub async fn upload_one_file(
        &self,
        request: Request,
        dir: impl AsRef<Path>,
    ) -> ToolkitResult<UploadedFile> {
        self.upload_files(request, dir)
            .await?
            .into_iter()
            .next()
            .ok_or(ToolkitError::NoFilesUploaded)
    }

    async fn receive(&self, request: Request, dir: &Path, batch: &mut Batch) -> ToolkitResult<()> {
        let (parts, body) = request.into_parts();
        let limit = self.policy.max_upload_bytes;

        check_content_length(&parts.headers, limit)?;
        create_dir_if_not_exist(dir).await?;
        let boundary = boundary_of(&parts.headers)?;

        let mut multipart = Multipart::new(BodyLimit::from_body(body, limit), boundary);
        while let Some(field) = multipart.next_field().await.map_err(classify_multipart_error)? {
            let original = match field.file_name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    tracing::debug!(field = ?field.name(), "Skipping non-file form field");
                    continue;
                }
            };

            let stored = self.store_part(field, original, dir).await?;
            batch.push(dir.join(&stored.assigned_name), stored);
        }

        Ok(())
    }

    async fn store_part(
        &self,
        mut field: Field<'_>,
        original_name: String,
        dir: &Path,
    ) -> ToolkitResult<UploadedFile> {
        let head = read_head(&mut field).await?;
        let content_type = sniff(&head);

        if !self.policy.permits(content_type) {
            tracing::warn!(
                content_type,
                original_name = ?original_name,
                "Rejected upload with disallowed content type"
            );
            return Err(ToolkitError::DisallowedFileType {
                content_type: content_type.to_string(),
            });
        }

        let assigned_name = self.assign_name(&original_name)?;

        // The temp path is removed when dropped, on error or cancellation.
        let (file, temp) = temp_file_in(dir)?.into_parts();
        let mut file = File::from_std(file);
        let byte_size = write_part(&mut file, &head, &mut field).await?;
        drop(file);

        let dest = dir.join(&assigned_name);
        temp.persist_noclobber(&dest)
            .map_err(|err| persist_failed(err, &dest, &assigned_name))?;

        tracing::debug!(
            assigned_name = %assigned_name,
            original_name = ?original_name,
            byte_size,
            content_type,
            "Stored uploaded file"
        );

        Ok(UploadedFile {
            assigned_name,
            original_name,
            byte_size,
            content_type: content_type.to_string(),
        })
    }

    fn assign_name(&self, original: &str) -> ToolkitResult<String> {
        if self.policy.rename_files {
            // The original only contributes an extension, so unusable names
            // still get a generated one.
            let ext = sanitize_file_name(original)
                .ok()
                .and_then(|name| extension_of(&name))
                .unwrap_or_default();
            Ok(format!("{}{ext}", random_string(GENERATED_NAME_LEN)))
        } else {
            sanitize_file_name(original)
        }
    }
}

fn boundary_of(headers: &HeaderMap) -> ToolkitResult<String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(ToolkitError::MalformedMultipart)?;

    multer::parse_boundary(content_type).map_err(|_| ToolkitError::MalformedMultipart)
}

/// Hidden temporary file inside `dir`, so the final rename stays on one filesystem.
fn temp_file_in(dir: &Path) -> ToolkitResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".upload-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(FILE_MODE));
    }
    Ok(builder.tempfile_in(dir)?)
}

fn persist_failed(err: PathPersistError, dest: &Path, assigned_name: &str) -> ToolkitError {
    // Dropping `err` drops its temp path, which removes the temporary file.
    if err.error.kind() == ErrorKind::AlreadyExists {
        tracing::warn!(assigned_name, "Refused to replace an existing file");
        return ToolkitError::FileExists {
            name: assigned_name.to_string(),
        };
    }
    tracing::error!(
        dest = %dest.display(),
        error = %err.error,
        "Failed to move upload into place"
    );
    ToolkitError::Io(err.error)
}

/// Buffer at least [`SNIFF_LEN`] bytes of the part, or all of it if shorter.
async fn read_head(field: &mut Field<'_>) -> ToolkitResult<BytesMut> {
    let mut head = BytesMut::with_capacity(SNIFF_LEN);
    while head.len() < SNIFF_LEN {
        match field.chunk().await.map_err(classify_multipart_error)? {
            Some(chunk) => head.extend_from_slice(&chunk),
            None => break,
        }
    }
    Ok(head)
}

/// Write `head` then the rest of the part to `file`. Returns bytes written.
async fn write_part(file: &mut File, head: &[u8], field: &mut Field<'_>) -> ToolkitResult<u64> {
    file.write_all(head).await?;
    let mut written = head.len() as u64;

    while let Some(chunk) = field.chunk().await.map_err(classify_multipart_error)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

fn classify_multipart_error(err: multer::Error) -> ToolkitError {
    match err {
        multer::Error::StreamReadFailed(source) => classify_stream_error(source),
        multer::Error::StreamSizeExceeded { limit } => ToolkitError::BodyTooLarge { limit },
        multer::Error::FieldSizeExceeded { limit, .. } => ToolkitError::BodyTooLarge { limit },
        other => {
            tracing::debug!(error = %other, "Multipart framing error");
            ToolkitError::MalformedMultipart
        }
    }
}
