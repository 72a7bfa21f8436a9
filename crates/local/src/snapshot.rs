use crate::error::Result;
use crate::folders::list_installed_folders;
use blessforge_manifest::Manifest;
use std::collections::HashMap;
use std::path::Path;
use time::UtcDateTime;
use tracing::instrument;

/// One logical add-on that is both installed and known to the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAddon {
    /// Logical add-on name from the manifest.
    pub name: String,
    /// Identifier of the add-on on the remote site.
    pub remote_id: String,
    /// Most recent modification time across all of the add-on's folders.
    pub modified: UtcDateTime,
    /// The folder that supplied [`modified`](Self::modified).
    pub folder: String,
}

/// Builds the local snapshot of installed add-ons.
///
/// Every immediate child of `dir` is joined against `manifest` by folder name.
/// Folders the manifest doesn't know about are dropped, as are manifest
/// entries that aren't installed. Folders sharing the same add-on name are
/// collapsed into a single [`LocalAddon`] carrying the greatest modification
/// time (ties keep the folder that sorts first).
///
/// The returned order is the order in which each add-on's first folder
/// appears in the name-sorted listing, so it is stable for an unchanged
/// directory. Downstream consumers rely on this order verbatim.
#[instrument(skip(manifest), fields(manifest = manifest.len()))]
pub async fn build(dir: &Path, manifest: &Manifest) -> Result<Vec<LocalAddon>> {
    let folders = list_installed_folders(dir).await?;
    let mut addons: Vec<LocalAddon> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for folder in folders {
        let Some(entry) = manifest.get(&folder.name) else {
            tracing::trace!(folder = %folder.name, "Folder not in manifest; ignoring");
            continue;
        };
        match index.get(&entry.name) {
            Some(&position) => {
                let existing = &mut addons[position];
                if folder.modified > existing.modified {
                    existing.modified = folder.modified;
                    existing.remote_id.clone_from(&entry.remote_id);
                    existing.folder = folder.name;
                }
            },
            None => {
                index.insert(entry.name.clone(), addons.len());
                addons.push(LocalAddon {
                    name: entry.name.clone(),
                    remote_id: entry.remote_id.clone(),
                    modified: folder.modified,
                    folder: folder.name,
                });
            },
        }
    }
    tracing::debug!(addons = addons.len(), "Local snapshot built");
    Ok(addons)
}
