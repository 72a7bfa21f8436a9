use blessforge_local::LocalAddon;
use derive_more::Display;
use time::UtcDateTime;

/// The result of looking up one remote identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The remote reported this last-updated timestamp.
    Success(UtcDateTime),
    /// The remote has no timestamp for the identifier (or the lookup failed
    /// in a way that isn't a timeout).
    NotFound,
    /// The lookup exceeded its time limit.
    TimedOut,
    /// The fetch was cancelled before this identifier was looked up.
    Cancelled,
}
impl FetchOutcome {
    /// Why the remote state is unknown, or `None` on success.
    pub fn failure(&self) -> Option<Failure> {
        match self {
            Self::Success(_) => None,
            Self::NotFound => Some(Failure::NotFound),
            Self::TimedOut => Some(Failure::TimedOut),
            Self::Cancelled => Some(Failure::Cancelled),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Reason the remote state of an add-on could not be determined.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    #[display("not found")]
    NotFound,
    #[display("timed out")]
    TimedOut,
    #[display("cancelled")]
    Cancelled,
}

/// Anything the fetch worker can look up.
pub trait Identified {
    /// Identifier of the item on the remote site.
    fn remote_id(&self) -> &str;
}
impl Identified for String {
    fn remote_id(&self) -> &str {
        self
    }
}
impl Identified for &str {
    fn remote_id(&self) -> &str {
        self
    }
}
impl Identified for LocalAddon {
    fn remote_id(&self) -> &str {
        &self.remote_id
    }
}

/// A fetch request paired with its outcome.
///
/// The worker hands back the item it was given alongside the outcome, so
/// requests and results can never drift out of alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub item: T,
    pub outcome: FetchOutcome,
}
impl<T> Fetched<T> {
    pub fn new(item: T, outcome: FetchOutcome) -> Self {
        Self { item, outcome }
    }
}
