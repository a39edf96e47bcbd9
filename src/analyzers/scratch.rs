//! Per-invocation scratch directories

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A uniquely named temporary directory owned by one analysis.
///
/// The directory and everything in it is removed when the value is dropped,
/// whether the analysis finished, failed, timed out or was cancelled.
/// Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("livelint-{prefix}-"))
            .tempdir()?;
        Ok(Self { dir: Some(dir) })
    }

    /// Path of the directory
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            // only reachable during drop
            None => Path::new(""),
        }
    }

    /// Write a file into the directory and return its full path
    pub async fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path().join(name);
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove scratch dir {}: {}", path.display(), e);
            }
        }
    }
}
