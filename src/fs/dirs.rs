//! Directory preparation.

use std::path::Path;

use tokio::fs::DirBuilder;

use crate::error::{ToolkitError, ToolkitResult};

/// Permissions for directories created by the toolkit.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Create `path` and any missing parents. Existing directories are left as
/// they are, so repeated calls succeed.
pub async fn create_dir_if_not_exist(path: impl AsRef<Path>) -> ToolkitResult<()> {
    let path = path.as_ref();

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);

    builder
        .create(path)
        .await
        .map_err(|source| ToolkitError::DirectoryCreateFailed {
            path: path.to_path_buf(),
            source,
        })
}
