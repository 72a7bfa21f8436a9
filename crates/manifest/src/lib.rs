//! Manifest of known add-ons.
//!
//! The manifest is a CSV file mapping every folder an add-on installs into
//! the game's `AddOns` directory to the add-on's display `Name` and the
//! `URL` suffix identifying it on the remote site:
//!
//! ```text
//! Folder,Name,URL
//! DBM-Core,Deadly Boss Mods,deadly-boss-mods
//! DBM-StatusBarTimers,Deadly Boss Mods,deadly-boss-mods
//! Details,Details! Damage Meter,details
//! ```
//!
//! Several folders may belong to the same add-on, but each folder appears
//! exactly once.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::instrument;

const FOLDER_COLUMN: &str = "Folder";
const NAME_COLUMN: &str = "Name";
const URL_COLUMN: &str = "URL";

// Identifiers are appended verbatim to the base URL, so anything that would
// change the meaning of the URL (or can't appear in a path segment) is out.
static REMOTE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s/?#]+$").unwrap());

/// One row of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestEntry {
    /// Name of the folder inside the installation directory (join key).
    pub folder: String,
    /// Logical add-on name; shared by all folders of the same add-on.
    pub name: String,
    /// Identifier of the add-on on the remote site.
    pub remote_id: String,
}

#[derive(Deserialize)]
struct Row {
    #[serde(rename = "Folder")]
    folder: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "URL")]
    url: String,
}

/// The loaded manifest, keyed by folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}
impl Manifest {
    /// Loads the manifest from a CSV file on disk.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
        let manifest = Self::from_reader(file)?;
        tracing::debug!(path = %path.display(), entries = manifest.len(), "Manifest loaded");
        Ok(manifest)
    }

    /// Parses a manifest from any CSV source with a header row.
    ///
    /// Columns may appear in any order; columns other than `Folder`, `Name`
    /// and `URL` are ignored.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers().or_raise(|| ErrorKind::MalformedRow(0))?;
        for column in [FOLDER_COLUMN, NAME_COLUMN, URL_COLUMN] {
            if !headers.iter().any(|header| header == column) {
                exn::bail!(ErrorKind::MissingColumn(column));
            }
        }
        let mut entries = HashMap::new();
        for (index, row) in reader.deserialize::<Row>().enumerate() {
            // Infallible: usize always fits in a u64 on supported targets.
            let row_number = u64::try_from(index).unwrap_or(u64::MAX).saturating_add(1);
            let row = row.or_raise(|| ErrorKind::MalformedRow(row_number))?;
            let entry = Self::validate(row, row_number)?;
            if entries.contains_key(&entry.folder) {
                exn::bail!(ErrorKind::DuplicateFolder(entry.folder));
            }
            entries.insert(entry.folder.clone(), entry);
        }
        Ok(Self { entries })
    }

    fn validate(row: Row, row_number: u64) -> Result<ManifestEntry> {
        for (field, value) in [(FOLDER_COLUMN, &row.folder), (NAME_COLUMN, &row.name), (URL_COLUMN, &row.url)] {
            if value.is_empty() {
                exn::bail!(ErrorKind::EmptyValue { field, row: row_number });
            }
        }
        if !REMOTE_ID_REGEX.is_match(&row.url) {
            exn::bail!(ErrorKind::InvalidRemoteId {
                row: row_number,
                value: row.url,
            });
        }
        Ok(ManifestEntry {
            folder: row.folder,
            name: row.name,
            remote_id: row.url,
        })
    }

    /// Looks up the entry for an installed folder.
    pub fn get(&self, folder: &str) -> Option<&ManifestEntry> {
        self.entries.get(folder)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
impl FromIterator<ManifestEntry> for Manifest {
    /// Builds a manifest from entries directly. Later entries replace earlier
    /// ones for the same folder.
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|entry| (entry.folder.clone(), entry)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    const MANIFEST: &str = "\
Folder,Name,URL
DBM-Core,Deadly Boss Mods,deadly-boss-mods
DBM-StatusBarTimers,Deadly Boss Mods,deadly-boss-mods
Details,Details! Damage Meter,details
";

    #[test]
    fn test_parses_rows() {
        let manifest = Manifest::from_reader(MANIFEST.as_bytes()).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.get("DBM-Core"),
            Some(&ManifestEntry {
                folder: "DBM-Core".to_string(),
                name: "Deadly Boss Mods".to_string(),
                remote_id: "deadly-boss-mods".to_string(),
            })
        );
        assert_eq!(manifest.get("Details").unwrap().name, "Details! Damage Meter");
        assert!(manifest.get("WeakAuras").is_none());
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let csv = "URL,Notes,Name,Folder\n  weakauras-2 , hi , WeakAuras , WeakAuras \n";
        let manifest = Manifest::from_reader(csv.as_bytes()).unwrap();
        let entry = manifest.get("WeakAuras").unwrap();
        assert_eq!(entry.name, "WeakAuras");
        assert_eq!(entry.remote_id, "weakauras-2");
    }

    #[test]
    fn test_header_only() {
        let manifest = Manifest::from_reader("Folder,Name,URL\n".as_bytes()).unwrap();
        assert!(manifest.is_empty());
    }

    #[rstest]
    #[case("Name,URL\nA,a\n", "Folder")]
    #[case("Folder,URL\nA,a\n", "Name")]
    #[case("Folder,Name\nA,A\n", "URL")]
    fn test_missing_column(#[case] csv: &str, #[case] column: &'static str) {
        let err = Manifest::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingColumn(column));
    }

    #[rstest]
    #[case("Folder,Name,URL\n,A,a\n", ErrorKind::EmptyValue { field: "Folder", row: 1 })]
    #[case("Folder,Name,URL\nA,A,a\nB,,b\n", ErrorKind::EmptyValue { field: "Name", row: 2 })]
    #[case("Folder,Name,URL\nA,A,a/b\n", ErrorKind::InvalidRemoteId { row: 1, value: "a/b".to_string() })]
    #[case("Folder,Name,URL\nA,A,a b\n", ErrorKind::InvalidRemoteId { row: 1, value: "a b".to_string() })]
    #[case("Folder,Name,URL\nA,A,a\nA,B,b\n", ErrorKind::DuplicateFolder("A".to_string()))]
    fn test_invalid_rows(#[case] csv: &str, #[case] expected: ErrorKind) {
        let err = Manifest::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(*err, expected);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addon_folders.csv");
        let err = Manifest::load(&path).unwrap_err();
        assert_eq!(*err, ErrorKind::Unreadable(path));
    }
}
