use blessforge_config::{LogLevel, Overrides};
use clap::Parser;
use std::path::PathBuf;

/// Check installed World of Warcraft add-ons for updates.
#[derive(Debug, Parser)]
#[command(name = "blessforge", version, about)]
pub struct Cli {
    /// Randomize the modified time of local add-on folders (for testing)
    #[arg(short, long)]
    pub randomize: bool,
    /// Set the logging level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(short = 'l', long = "log", value_name = "LEVEL", value_parser = parse_level)]
    pub log_level: Option<LogLevel>,
    /// The game's AddOns folder; remembered for later runs
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,
    /// CSV file mapping add-on folders to add-ons
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
    /// Extra configuration file (TOML or YAML)
    #[arg(long, value_name = "FILE", env = "BLESSFORGE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Number of add-ons to look up at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Seconds to wait for each add-on page
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            manifest: self.manifest.clone(),
            install_dir: self.install_dir.clone(),
            timeout: self.timeout,
            concurrency: self.concurrency,
            randomize: self.randomize.then_some(true),
            log_level: self.log_level,
        }
    }
}

fn parse_level(value: &str) -> Result<LogLevel, String> {
    value.parse().map_err(|_| format!("expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL; got {value:?}"))
}
