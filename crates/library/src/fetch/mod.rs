//! The remote fetch worker.
//!
//! Looks up the last-updated timestamp of every tracked add-on, in input
//! order, tolerating per-item failures and honouring cooperative
//! cancellation. The primary entry point is [`fetch`], which streams
//! [`FetchEvent`]s; [`fetch_all`] drives that stream with a progress callback
//! for callers that just want the outcomes.

mod outcome;
mod stream;

pub use self::outcome::{Failure, FetchOutcome, Fetched, Identified};
pub use self::stream::{FetchEvent, FetchOptions, fetch, fetch_all};
