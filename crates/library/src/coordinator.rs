use crate::error::{ErrorKind, Result};
use crate::fetch::{FetchEvent, FetchOptions, Fetched, fetch};
use crate::reconcile::{ReconciledAddon, Status, reconcile_fetched};
use blessforge_local::LocalAddon;
use blessforge_manifest::Manifest;
use blessforge_remote::{LookupHandle, Url};
use exn::ResultExt;
use futures::StreamExt;
use std::path::PathBuf;
use std::pin::pin;
use time::UtcDateTime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Where a run reads its inputs from, and how it fetches.
#[derive(Debug, Clone)]
pub struct Settings {
    pub install_dir: PathBuf,
    pub manifest: PathBuf,
    pub fetch: FetchOptions,
}

/// What the front end gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Progress {
        done: usize,
        total: usize,
    },
    /// Outdated add-ons and add-ons whose remote state is unknown, in
    /// snapshot order.
    Outcome(Vec<ReconciledAddon>),
    /// The fetch was shut down; there is no result.
    Cancelled,
    /// The fetch task died before finishing; there is no result.
    Aborted,
    LinkRequested(Url),
}

/// Result of [`Coordinator::trigger_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triggered {
    Started { generation: u64, total: usize },
    /// A fetch is already in flight; the trigger was ignored.
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Stop looking up further add-ons, but still report what is known.
    User,
    /// Stop and report nothing.
    Shutdown,
}

enum Message {
    Fetch(FetchEvent<LocalAddon>),
    /// The fetch task ended without a terminal event.
    Aborted,
    Link(Url),
}

struct Envelope {
    generation: u64,
    message: Message,
}

/// Sends [`Message::Aborted`] when dropped before the fetch finished, so a
/// panicking lookup still ends the fetch.
struct FinishGuard {
    sender: mpsc::UnboundedSender<Envelope>,
    generation: u64,
    finished: bool,
}
impl Drop for FinishGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::error!(generation = self.generation, "Fetch task stopped before finishing");
            let _ = self.sender.send(Envelope {
                generation: self.generation,
                message: Message::Aborted,
            });
        }
    }
}

struct ActiveFetch {
    generation: u64,
    cancel: CancellationToken,
    reason: Option<CancelReason>,
}

/// Owns the lifecycle of update checks.
///
/// At most one fetch is in flight at a time: [`trigger_fetch`](Self::trigger_fetch)
/// while one is running returns [`Triggered::AlreadyRunning`] and changes
/// nothing. The fetch runs on its own Tokio task and reports back through a
/// channel. Every fetch gets a new generation number and messages tagged with
/// any other generation are dropped, so a superseded fetch can never leak
/// progress or results into a newer one. A fetch task that dies without
/// finishing (a panicking lookup) ends with [`Event::Aborted`].
pub struct Coordinator {
    settings: Settings,
    lookup: LookupHandle,
    generation: u64,
    active: Option<ActiveFetch>,
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: mpsc::UnboundedReceiver<Envelope>,
}
impl Coordinator {
    pub fn new(settings: Settings, lookup: LookupHandle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            settings,
            lookup,
            generation: 0,
            active: None,
            sender,
            receiver,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Rebuilds the manifest and local snapshot, then starts fetching in the
    /// background.
    ///
    /// # Errors
    /// - [`Manifest`](ErrorKind::Manifest) if the manifest can't be loaded,
    /// - [`Snapshot`](ErrorKind::Snapshot) if the installation directory can't be read.
    #[instrument(skip(self), fields(lookup = self.lookup.name()))]
    pub async fn trigger_fetch(&mut self) -> Result<Triggered> {
        if let Some(active) = &self.active {
            tracing::debug!(generation = active.generation, "Fetch already running; ignoring trigger");
            return Ok(Triggered::AlreadyRunning);
        }
        let manifest = Manifest::load(&self.settings.manifest).or_raise(|| ErrorKind::Manifest)?;
        let addons = blessforge_local::build(&self.settings.install_dir, &manifest)
            .await
            .or_raise(|| ErrorKind::Snapshot)?;

        self.generation += 1;
        let generation = self.generation;
        let total = addons.len();
        let cancel = CancellationToken::new();
        tracing::debug!(generation, total, "Starting fetch");

        let lookup = self.lookup.clone();
        let mut guard = FinishGuard {
            sender: self.sender.clone(),
            generation,
            finished: false,
        };
        let token = cancel.clone();
        let options = self.settings.fetch.clone();
        tokio::spawn(async move {
            let mut events = pin!(fetch(&lookup, addons, token, options));
            while let Some(event) = events.next().await {
                let terminal = event.is_terminal();
                let envelope = Envelope {
                    generation,
                    message: Message::Fetch(event),
                };
                if guard.sender.send(envelope).is_err() {
                    tracing::debug!(generation, "Coordinator dropped; abandoning fetch");
                    guard.finished = true;
                    break;
                }
                guard.finished = terminal;
            }
        });

        self.active = Some(ActiveFetch {
            generation,
            cancel,
            reason: None,
        });
        Ok(Triggered::Started { generation, total })
    }

    /// Asks the running fetch to stop. Returns immediately; the end of the
    /// fetch is reported by [`next_event`](Self::next_event).
    ///
    /// Lookups already in flight are allowed to finish. Does nothing when no
    /// fetch is running. A [`Shutdown`](CancelReason::Shutdown) overrides an
    /// earlier [`User`](CancelReason::User) cancellation, never the reverse.
    pub fn cancel_fetch(&mut self, reason: CancelReason) {
        let Some(active) = &mut self.active else {
            return;
        };
        tracing::debug!(generation = active.generation, ?reason, "Cancelling fetch");
        if active.reason != Some(CancelReason::Shutdown) {
            active.reason = Some(reason);
        }
        active.cancel.cancel();
    }

    /// Link to the remote page of an add-on, or `None` when its remote state
    /// is unknown.
    pub fn link_for(&self, addon: &ReconciledAddon) -> Result<Option<Url>> {
        if addon.status.is_unknown() {
            return Ok(None);
        }
        let url = self
            .lookup
            .url(&addon.remote_id)
            .or_raise(|| ErrorKind::Link(addon.remote_id.clone()))?;
        Ok(Some(url))
    }

    /// Queues an [`Event::LinkRequested`] for the add-on. Returns `false`
    /// (and queues nothing) when the add-on has no link.
    pub fn request_link(&self, addon: &ReconciledAddon) -> Result<bool> {
        let Some(url) = self.link_for(addon)? else {
            return Ok(false);
        };
        // The receiver lives in `self`, so sending can't fail.
        let _ = self.sender.send(Envelope {
            generation: self.generation,
            message: Message::Link(url),
        });
        Ok(true)
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once nothing is running and nothing is queued. Safe to
    /// use in `tokio::select!`: no event is lost if the future is dropped.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            let envelope = match self.active {
                Some(_) => self.receiver.recv().await?,
                None => self.receiver.try_recv().ok()?,
            };
            let event = match envelope.message {
                Message::Link(url) => return Some(Event::LinkRequested(url)),
                Message::Fetch(event) => Some(event),
                Message::Aborted => None,
            };
            let Some(active) = self.active.as_ref().filter(|active| active.generation == envelope.generation) else {
                tracing::debug!(generation = envelope.generation, "Discarding stale fetch message");
                continue;
            };
            let reason = active.reason;
            let fetched = match event {
                Some(FetchEvent::Progress { done, total }) => return Some(Event::Progress { done, total }),
                Some(FetchEvent::Complete(fetched) | FetchEvent::Cancelled(fetched)) => fetched,
                None => {
                    self.active = None;
                    if reason == Some(CancelReason::Shutdown) {
                        return Some(Event::Cancelled);
                    }
                    return Some(Event::Aborted);
                },
            };
            self.active = None;
            return Some(self.finish(envelope.generation, reason, &fetched));
        }
    }

    fn finish(&self, generation: u64, reason: Option<CancelReason>, fetched: &[Fetched<LocalAddon>]) -> Event {
        if reason == Some(CancelReason::Shutdown) {
            tracing::debug!(generation, "Fetch shut down; discarding results");
            return Event::Cancelled;
        }
        let reconciled = reconcile_fetched(fetched, UtcDateTime::now());
        let unknown = reconciled.iter().filter(|r| matches!(r.status, Status::Unknown(_))).count();
        tracing::info!(
            generation,
            checked = fetched.len(),
            outdated = reconciled.len() - unknown,
            unknown,
            "Update check finished"
        );
        Event::Outcome(reconciled)
    }
}
impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}
