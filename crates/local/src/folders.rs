use crate::error::{ErrorKind, Result};
use std::path::Path;
use time::UtcDateTime;
use tokio::fs::{self, DirEntry};
use tracing::instrument;

/// An immediate child of the installation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledFolder {
    /// File name of the entry (not the full path).
    pub name: String,
    /// Last modification time reported by the filesystem.
    pub modified: UtcDateTime,
}

/// Lists the immediate children of `dir` with their modification times,
/// sorted by name.
///
/// Both directories and plain files are listed; the manifest join decides
/// what is relevant. Entries whose names are not valid UTF-8 (they can never
/// match a manifest row) and dangling symlinks are skipped.
///
/// # Errors
///
/// Returns [`NotFound`](ErrorKind::NotFound), [`NotADirectory`](ErrorKind::NotADirectory)
/// or [`PermissionDenied`](ErrorKind::PermissionDenied) if `dir` is unusable.
#[instrument]
pub async fn list_installed_folders(dir: &Path) -> Result<Vec<InstalledFolder>> {
    let metadata = fs::metadata(dir).await.map_err(|e| ErrorKind::from_io(e, dir))?;
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
    }
    let mut entries = fs::read_dir(dir).await.map_err(|e| ErrorKind::from_io(e, dir))?;
    let mut folders = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, dir))? {
        if let Some(folder) = process_entry(entry).await? {
            folders.push(folder);
        }
    }
    folders.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(dir = %dir.display(), count = folders.len(), "Listed installed folders");
    Ok(folders)
}

async fn process_entry(entry: DirEntry) -> Result<Option<InstalledFolder>> {
    let path = entry.path();
    let Ok(name) = entry.file_name().into_string() else {
        tracing::warn!(path = %path.display(), "Skipping entry with non UTF-8 name");
        return Ok(None);
    };
    // Follow symlinks: a linked add-on folder counts as installed.
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Skipping dangling symlink");
            return Ok(None);
        },
        Err(e) => exn::bail!(ErrorKind::from_io(e, &path)),
    };
    let modified = metadata.modified().map_err(|e| ErrorKind::from_io(e, &path))?;
    Ok(Some(InstalledFolder {
        name,
        modified: UtcDateTime::from(modified),
    }))
}
