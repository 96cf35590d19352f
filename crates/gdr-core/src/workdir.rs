use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{link::FolderId, Result};

/// Per-request staging directory under the download root.
///
/// The directory is removed when the guard is dropped unless it was already
/// removed via [`WorkDir::remove`] or released via [`WorkDir::keep`].
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    armed: bool,
}

impl WorkDir {
    /// Create `<root>/<folder_id>-<uuid>`. Never reuses an existing directory.
    pub async fn create(root: &Path, folder: &FolderId) -> Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let path = root.join(format!("{folder}-{}", Uuid::new_v4().simple()));
        tokio::fs::create_dir(&path).await?;
        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything under it.
    pub async fn remove(mut self) -> Result<()> {
        self.armed = false;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Leave the directory on disk and return its path.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove work dir"
                );
            }
        }
    }
}
