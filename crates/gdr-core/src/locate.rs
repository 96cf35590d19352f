//! Finding the downloaded files inside a work directory.
//!
//! `gdown --folder` sometimes writes into `<dest>/<Folder Name>/` and sometimes
//! straight into `<dest>/`; both layouts are handled here.

use std::path::{Path, PathBuf};

use crate::{errors::Error, Result};

/// Which layout the downloader produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Files live in the first sub-directory of the work dir.
    Nested,
    /// Files live directly in the work dir.
    Flat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// The directory holding the files plus the files themselves, in name order.
#[derive(Clone, Debug)]
pub struct LocatedSource {
    pub dir: PathBuf,
    pub layout: Layout,
    pub files: Vec<DownloadedFile>,
}

/// Resolve the source directory under `work_dir` and list its regular files.
///
/// If the first entry (by name) is a directory, that directory is the source;
/// otherwise the work dir itself is. Fails with [`Error::EmptyResult`] when the
/// work dir is empty or the chosen source holds no regular files.
pub async fn locate_source(work_dir: &Path) -> Result<LocatedSource> {
    let entries = sorted_entries(work_dir).await?;
    let Some(first) = entries.first() else {
        return Err(Error::EmptyResult {
            dir: work_dir.to_path_buf(),
        });
    };

    let (dir, layout) = if tokio::fs::metadata(first).await?.is_dir() {
        (first.clone(), Layout::Nested)
    } else {
        (work_dir.to_path_buf(), Layout::Flat)
    };

    let files = list_files(&dir).await?;
    if files.is_empty() {
        return Err(Error::EmptyResult { dir });
    }

    Ok(LocatedSource { dir, layout, files })
}

/// Regular files directly under `dir` (symlinks followed), sorted by name.
pub async fn list_files(dir: &Path) -> Result<Vec<DownloadedFile>> {
    let mut out = Vec::new();
    for path in sorted_entries(dir).await? {
        let md = match tokio::fs::metadata(&path).await {
            Ok(md) => md,
            // Dangling symlink.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        if !md.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        out.push(DownloadedFile {
            name,
            path,
            size: md.len(),
        });
    }
    Ok(out)
}

async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut rd = tokio::fs::read_dir(dir).await?;
    let mut out = Vec::new();
    while let Some(ent) = rd.next_entry().await? {
        out.push(ent.path());
    }
    out.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(out)
}
