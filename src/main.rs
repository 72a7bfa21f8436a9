mod cli;
mod error;
mod logging;
mod report;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use blessforge_config::{Config, InstallLocation};
use blessforge_library::{CancelReason, Coordinator, Event, FetchOptions, Settings, Triggered};
use blessforge_remote::LookupHandle;
use blessforge_remote::backend::{HttpLookup, HttpOptions};
use clap::Parser;
use exn::ResultExt;
use std::io::Write;
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "Exiting");
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), &cli.overrides()).or_raise(|| ErrorKind::Config)?;
    logging::init(config.log_level).map_err(|_| ErrorKind::Logging)?;
    tracing::debug!(?config, "Configuration loaded");
    let install = InstallLocation::resolve(&config).or_raise(|| ErrorKind::Config)?;

    if config.randomize {
        tracing::debug!("Randomizing addon folders");
        let dir = install.path.clone();
        let touched = tokio::task::spawn_blocking(move || blessforge_local::randomize(&dir, &mut rand::rng()))
            .await
            .or_raise(|| ErrorKind::Randomize)?
            .or_raise(|| ErrorKind::Randomize)?;
        tracing::debug!(touched, "Randomized addon folders");
    } else {
        tracing::debug!("Not randomizing");
    }

    let options = HttpOptions {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
    };
    let base_url = config.base_url().or_raise(|| ErrorKind::Config)?;
    let lookup: LookupHandle =
        Arc::new(HttpLookup::new("curseforge", base_url, options).or_raise(|| ErrorKind::Config)?);
    let settings = Settings {
        install_dir: install.path,
        manifest: config.manifest.clone(),
        fetch: FetchOptions {
            timeout: config.timeout(),
            concurrency: config.concurrency,
        },
    };
    let mut coordinator = Coordinator::new(settings, lookup);
    check(&mut coordinator).await
}

/// Runs one update check to completion, printing progress and the result.
async fn check(coordinator: &mut Coordinator) -> Result<ExitCode> {
    if let Triggered::Started { total, .. } = coordinator.trigger_fetch().await.or_raise(|| ErrorKind::Check)? {
        tracing::debug!(total, "Checking add-ons");
    }
    let mut shutdown = pin!(tokio::signal::ctrl_c());
    let mut shutting_down = false;
    loop {
        tokio::select! {
            event = coordinator.next_event() => match event {
                Some(Event::Progress { done, total }) => {
                    eprint!("\rChecked {done} of {total}");
                    if done == total {
                        eprintln!();
                    }
                    let _ = std::io::stderr().flush();
                },
                Some(Event::Outcome(addons)) => {
                    let table = report::render(&addons, |addon| coordinator.link_for(addon).ok().flatten());
                    print!("{table}");
                    return Ok(ExitCode::SUCCESS);
                },
                Some(Event::Cancelled) => {
                    eprintln!();
                    return Ok(ExitCode::from(130));
                },
                Some(Event::Aborted) => {
                    eprintln!();
                    exn::bail!(ErrorKind::Check);
                },
                Some(Event::LinkRequested(url)) => println!("{url}"),
                None => return Ok(ExitCode::SUCCESS),
            },
            result = &mut shutdown, if !shutting_down => {
                if let Err(err) = result {
                    tracing::warn!(error = %err, "Unable to listen for Ctrl-C");
                }
                shutting_down = true;
                eprintln!("\nFinishing up...");
                coordinator.cancel_fetch(CancelReason::Shutdown);
            },
        }
    }
}
