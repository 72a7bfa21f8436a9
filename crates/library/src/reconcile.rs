//! Merges fetch outcomes back into the local snapshot.

use crate::fetch::{Failure, FetchOutcome, Fetched};
use blessforge_local::LocalAddon;
use time::UtcDateTime;

/// Whether an add-on needs updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The remote copy is strictly newer than the installed one.
    Outdated,
    /// The remote state could not be determined. Always surfaced to the user
    /// and never treated as up to date.
    Unknown(Failure),
}
impl Status {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledAddon {
    pub name: String,
    pub remote_id: String,
    pub local_modified: UtcDateTime,
    /// The remote timestamp, or the reconciliation time when the remote
    /// state is [unknown](Status::Unknown).
    pub remote_modified: UtcDateTime,
    pub status: Status,
}

/// Reconciles a snapshot against index-aligned fetch outcomes, using the
/// current time for add-ons whose remote state is unknown.
///
/// # Panics
/// When `local` and `outcomes` differ in length.
pub fn reconcile(local: &[LocalAddon], outcomes: &[FetchOutcome]) -> Vec<ReconciledAddon> {
    reconcile_at(local, outcomes, UtcDateTime::now())
}

/// Same as [`reconcile`] with an explicit "now".
///
/// Only add-ons that are [`Outdated`](Status::Outdated) or
/// [`Unknown`](Status::Unknown) are returned, in input order.
///
/// # Panics
/// When `local` and `outcomes` differ in length. That can only happen if the
/// caller paired outcomes from one fetch with the snapshot of another.
pub fn reconcile_at(local: &[LocalAddon], outcomes: &[FetchOutcome], now: UtcDateTime) -> Vec<ReconciledAddon> {
    assert_eq!(
        local.len(),
        outcomes.len(),
        "fetch outcomes must be index-aligned with the local snapshot"
    );
    local
        .iter()
        .zip(outcomes)
        .filter_map(|(addon, outcome)| decide(addon, *outcome, now))
        .collect()
}

/// Reconciles fetch results that carry their own add-on, so alignment is
/// guaranteed by construction.
pub fn reconcile_fetched(fetched: &[Fetched<LocalAddon>], now: UtcDateTime) -> Vec<ReconciledAddon> {
    fetched.iter().filter_map(|f| decide(&f.item, f.outcome, now)).collect()
}

fn decide(addon: &LocalAddon, outcome: FetchOutcome, now: UtcDateTime) -> Option<ReconciledAddon> {
    let (remote_modified, status) = match outcome {
        FetchOutcome::Success(updated) if updated > addon.modified => (updated, Status::Outdated),
        FetchOutcome::Success(_) => {
            tracing::debug!(addon = %addon.name, "Up to date");
            return None;
        },
        FetchOutcome::NotFound => (now, Status::Unknown(Failure::NotFound)),
        FetchOutcome::TimedOut => (now, Status::Unknown(Failure::TimedOut)),
        FetchOutcome::Cancelled => (now, Status::Unknown(Failure::Cancelled)),
    };
    Some(ReconciledAddon {
        name: addon.name.clone(),
        remote_id: addon.remote_id.clone(),
        local_modified: addon.modified,
        remote_modified,
        status,
    })
}
