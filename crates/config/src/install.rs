use crate::Config;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

const WINDOWS_INSTALL_DIR: &str = "C:/Program Files/World of Warcraft/_retail_/Interface/AddOns";
const MACOS_INSTALL_DIR: &str = "/Applications/World of Warcraft/_retail_/Interface/AddOns";

/// Where the game's `AddOns` directory usually lives on this platform, if
/// the game is supported here at all.
pub fn default_install_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        Some(PathBuf::from(WINDOWS_INSTALL_DIR))
    } else if cfg!(target_os = "macos") {
        Some(PathBuf::from(MACOS_INSTALL_DIR))
    } else {
        None
    }
}

/// How the installation directory was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    /// Set explicitly (`--install-dir`, environment or config file).
    Configured,
    /// Read back from the install file written by an earlier run.
    Persisted,
    /// The platform default, found on first run.
    Discovered,
}

/// The resolved installation (`AddOns`) directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLocation {
    pub path: PathBuf,
    pub source: InstallSource,
}
impl InstallLocation {
    /// Resolves the installation directory, remembering it for next time.
    ///
    /// In order of preference: the configured `install_dir`, the first line
    /// of `install_file`, then the platform default. Whatever is chosen on a
    /// first run is written to `install_file`; an existing file is never
    /// overwritten.
    ///
    /// # Errors
    /// - [`InstallDir`](ErrorKind::InstallDir) if the chosen path isn't a directory,
    /// - [`InstallDirUnknown`](ErrorKind::InstallDirUnknown) if nothing is configured and the default is missing,
    /// - [`InstallFile`](ErrorKind::InstallFile) if the install file can't be read or written.
    pub fn resolve(config: &Config) -> Result<Self> {
        Self::resolve_with(config, default_install_dir())
    }

    #[instrument(skip(config), fields(install_file = %config.install_file.display()))]
    fn resolve_with(config: &Config, default: Option<PathBuf>) -> Result<Self> {
        let location = if let Some(dir) = &config.install_dir {
            Self::new(dir.clone(), InstallSource::Configured)?
        } else if let Some(dir) = read_install_file(&config.install_file)? {
            Self::new(dir, InstallSource::Persisted)?
        } else if let Some(dir) = default
            && dir.is_dir()
        {
            Self::new(dir, InstallSource::Discovered)?
        } else {
            exn::bail!(ErrorKind::InstallDirUnknown);
        };
        if location.source != InstallSource::Persisted {
            persist(&config.install_file, &location.path)?;
        }
        tracing::debug!(path = %location.path.display(), source = ?location.source, "Install folder");
        Ok(location)
    }

    fn new(path: PathBuf, source: InstallSource) -> Result<Self> {
        if !path.is_dir() {
            exn::bail!(ErrorKind::InstallDir(path));
        }
        Ok(Self { path, source })
    }
}

fn read_install_file(install_file: &Path) -> Result<Option<PathBuf>> {
    let file = match File::open(install_file) {
        Ok(file) => file,
        Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).or_raise(|| ErrorKind::InstallFile(install_file.to_path_buf())),
    };
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .or_raise(|| ErrorKind::InstallFile(install_file.to_path_buf()))?;
    let line = line.trim();
    if line.is_empty() {
        exn::bail!(ErrorKind::InstallFile(install_file.to_path_buf()));
    }
    Ok(Some(PathBuf::from(line)))
}

/// Writes `dir` to `install_file` unless the file already exists.
fn persist(install_file: &Path, dir: &Path) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(install_file) {
        Ok(file) => file,
        Err(err) if err.kind() == IoErrorKind::AlreadyExists => return Ok(()),
        Err(err) => return Err(err).or_raise(|| ErrorKind::InstallFile(install_file.to_path_buf())),
    };
    writeln!(file, "{}", dir.display()).or_raise(|| ErrorKind::InstallFile(install_file.to_path_buf()))?;
    tracing::info!(install_file = %install_file.display(), path = %dir.display(), "Remembered install folder");
    Ok(())
}
