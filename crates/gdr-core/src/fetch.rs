use std::path::Path;

use async_trait::async_trait;

use crate::{link::FolderId, Result};

/// Port for the external folder downloader.
///
/// Implementations must not block the runtime and must leave everything they
/// retrieved under `dest`. Success means the tool reported success; whether
/// anything actually landed in `dest` is checked by the locator.
#[async_trait]
pub trait FolderFetcher: Send + Sync {
    async fn fetch(&self, folder: &FolderId, dest: &Path) -> Result<()>;
}
