use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use super::store::ArtifactStore;
use crate::error::{EtlError, Result};

/// Writes artifacts as `<root>/<name>.parquet` on the local filesystem.
///
/// Bytes go to a temp file in `root` first, are fsynced, and are then renamed
/// over the final path, after which `root` itself is fsynced. The temp file is removed if anything fails before the
/// rename.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.parquet"))
    }
}

/// Replaces `final_path` with `bytes` via temp file + rename in `dir`.
pub(crate) fn write_atomic(dir: &Path, final_path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| EtlError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EtlError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| EtlError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| EtlError::io(tmp.path(), e))?;

    tmp.persist(final_path)
        .map_err(|e| EtlError::io(final_path, e.error))?;
    sync_dir(dir)
}

/// Makes the rename in `dir` durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    std::fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| EtlError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl ArtifactStore for LocalStore {
    fn location(&self, name: &str) -> String {
        self.artifact_path(name).display().to_string()
    }

    async fn put(&self, name: &str, bytes: Bytes) -> Result<String> {
        let root = self.root.clone();
        let final_path = self.artifact_path(name);
        let location = final_path.display().to_string();

        debug!(path = %location, bytes = bytes.len(), "Writing local artifact");
        tokio::task::spawn_blocking(move || write_atomic(&root, &final_path, &bytes))
            .await
            .map_err(|e| EtlError::TaskJoin(e.to_string()))??;

        Ok(location)
    }
}
