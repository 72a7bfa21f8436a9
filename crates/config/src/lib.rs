//! Configuration for blessforge.
//!
//! Settings are layered with [`figment`], later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. `config.toml` / `config.yaml` in the user's config directory,
//! 3. an explicit config file (`--config`),
//! 4. `BLESSFORGE_*` environment variables,
//! 5. command-line [`Overrides`].
//!
//! Where the game keeps its add-ons is resolved separately, by
//! [`InstallLocation::resolve`], because it may need to touch the disk.

pub mod error;
mod install;
mod level;

pub use crate::install::{InstallLocation, InstallSource, default_install_dir};
pub use crate::level::LogLevel;
use crate::error::{ErrorKind, Result};
use blessforge_remote::Url;
use blessforge_remote::backend::DEFAULT_USER_AGENT;
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "BLESSFORGE_";
const APPLICATION: &str = "blessforge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV file mapping add-on folders to add-ons.
    pub manifest: PathBuf,
    /// File remembering the installation directory between runs.
    pub install_file: PathBuf,
    /// Installation (`AddOns`) directory; takes precedence over `install_file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    /// Remote identifiers are appended to this URL.
    pub base_url: String,
    /// Per-lookup timeout, in seconds.
    pub timeout: u64,
    /// Lookups in flight at once.
    pub concurrency: usize,
    pub user_agent: String,
    /// Scramble local modification times before checking (testing aid).
    pub randomize: bool,
    pub log_level: LogLevel,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("./addon_folders.csv"),
            install_file: PathBuf::from("./local.info"),
            install_dir: None,
            base_url: blessforge_remote::DEFAULT_BASE_URL.to_string(),
            timeout: 30,
            concurrency: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            randomize: false,
            log_level: LogLevel::default(),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Config {
    /// Loads, layers and validates the configuration.
    ///
    /// # Errors
    /// - [`FileNotFound`](ErrorKind::FileNotFound) if `file` doesn't exist,
    /// - [`Parse`](ErrorKind::Parse) if any layer is malformed,
    /// - [`InvalidValue`](ErrorKind::InvalidValue) if the merged result is out of range.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let user_dir = ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().to_path_buf());
        let figment = Self::figment(user_dir.as_deref(), file, overrides)?;
        let config: Self = figment.extract().map_err(|err| ErrorKind::Parse(err.to_string()))?;
        config.validate()
    }

    /// Every configuration layer, merged but not yet extracted.
    pub fn figment(user_dir: Option<&Path>, file: Option<&Path>, overrides: &Overrides) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(dir) = user_dir {
            figment = figment
                .merge(Toml::file(dir.join("config.toml")))
                .merge(Yaml::file(dir.join("config.yaml")));
        }
        if let Some(file) = file {
            if !file.is_file() {
                exn::bail!(ErrorKind::FileNotFound(file.to_path_buf()));
            }
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides)))
    }

    /// Checks ranges and normalizes the base URL to end with a slash.
    pub fn validate(mut self) -> Result<Self> {
        if self.timeout == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                field: "timeout",
                reason: "must be at least one second".to_string(),
            });
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        self.base_url()?;
        Ok(self)
    }

    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|err| ErrorKind::InvalidValue {
            field: "base_url",
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::InvalidValue {
                field: "base_url",
                reason: format!("unsupported scheme: {}", url.scheme()),
            });
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
