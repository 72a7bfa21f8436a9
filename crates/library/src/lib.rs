//! The update-reconciliation pipeline.
//!
//! ```text
//! manifest + AddOns dir ──▶ blessforge_local::build ──▶ Vec<LocalAddon>
//!                                                           │
//!                                         fetch::fetch (one lookup per add-on)
//!                                                           │
//!                                                 Vec<Fetched<LocalAddon>>
//!                                                           │
//!                                      reconcile::reconcile_fetched ──▶ outdated add-ons
//! ```
//!
//! [`Coordinator`] owns a run: it rebuilds the local snapshot, runs the fetch
//! worker on its own task and turns worker messages into [`Event`]s.

mod coordinator;
pub mod error;
pub mod fetch;
pub mod reconcile;

pub use crate::coordinator::{CancelReason, Coordinator, Event, Settings, Triggered};
pub use crate::fetch::{Failure, FetchEvent, FetchOptions, FetchOutcome, Fetched, Identified};
pub use crate::reconcile::{ReconciledAddon, Status};

/// Upper bound on concurrent remote lookups, whatever the configuration says.
pub const MAX_FETCH_CONCURRENCY: usize = 16;
