use crate::MAX_FETCH_CONCURRENCY;
use crate::fetch::{FetchOutcome, Fetched, Identified};
use async_stream::stream;
use blessforge_remote::LookupHandle;
use blessforge_remote::error::ErrorKind as RemoteErrorKind;
use futures::stream::FuturesOrdered;
use futures::{Stream, StreamExt};
use std::pin::pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Events emitted by [`fetch`].
///
/// Events follow a strict ordering:
/// 1. [`Progress`](Self::Progress) with `done = 0`, exactly once, before any
///    network activity.
/// 2. [`Progress`](Self::Progress) zero or more times, `done` strictly
///    increasing, one per looked-up item.
/// 3. Exactly one terminal event, [`Complete`](Self::Complete) or
///    [`Cancelled`](Self::Cancelled), after which the stream ends.
///
/// Both terminal events carry one [`Fetched`] per input item, in input order.
#[derive(Debug)]
pub enum FetchEvent<T> {
    Progress { done: usize, total: usize },
    /// Every item was looked up.
    Complete(Vec<Fetched<T>>),
    /// Cancellation stopped the fetch early; items that were never looked up
    /// carry [`FetchOutcome::Cancelled`].
    Cancelled(Vec<Fetched<T>>),
}
impl<T> FetchEvent<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Time allowed for a single lookup before it counts as timed out.
    pub timeout: Duration,
    /// Number of lookups allowed in flight at once (clamped to
    /// `1..=`[`MAX_FETCH_CONCURRENCY`]).
    pub concurrency: usize,
}
impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            concurrency: 1,
        }
    }
}

/// Streams [`FetchEvent`]s while looking up the last-updated timestamp of
/// every item, in input order.
///
/// Up to `options.concurrency` lookups run at once, but results are always
/// reported in input order. A failed lookup never stops the batch: lookup
/// timeouts (either the lookup's own or `options.timeout`) become
/// [`TimedOut`](FetchOutcome::TimedOut), every other failure becomes
/// [`NotFound`](FetchOutcome::NotFound).
///
/// `cancel` is checked before each item is started. Once it fires no new
/// lookups start, lookups already in flight finish normally, and the
/// remaining items are reported as [`Cancelled`](FetchOutcome::Cancelled).
pub fn fetch<'a, T>(
    lookup: &'a LookupHandle,
    items: Vec<T>,
    cancel: CancellationToken,
    options: FetchOptions,
) -> impl Stream<Item = FetchEvent<T>> + 'a
where
    T: Identified + Send + 'a,
{
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let total = items.len();
        let concurrency = options.concurrency.clamp(1, MAX_FETCH_CONCURRENCY);
        tracing::debug!(lookup = lookup.name(), total, concurrency, "Fetch started");
        yield FetchEvent::Progress { done: 0, total };

        let mut pending = items.into_iter();
        let mut in_flight = FuturesOrdered::new();
        let mut fetched = Vec::with_capacity(total);
        loop {
            while in_flight.len() < concurrency && !cancel.is_cancelled() {
                let Some(item) = pending.next() else {
                    break;
                };
                in_flight.push_back(fetch_one(lookup, item, options.timeout));
            }
            let Some(result) = in_flight.next().await else {
                break;
            };
            fetched.push(result);
            yield FetchEvent::Progress { done: fetched.len(), total };
        }

        if fetched.len() < total {
            tracing::info!(done = fetched.len(), total, "Fetch cancelled");
            fetched.extend(pending.map(|item| Fetched::new(item, FetchOutcome::Cancelled)));
            yield FetchEvent::Cancelled(fetched);
        } else {
            tracing::debug!(total, "Fetch complete");
            yield FetchEvent::Complete(fetched);
        }
    })
}

async fn fetch_one<T: Identified>(lookup: &LookupHandle, item: T, timeout: Duration) -> Fetched<T> {
    let remote_id = item.remote_id();
    let outcome = match tokio::time::timeout(timeout, lookup.last_updated(remote_id)).await {
        Ok(Ok(updated)) => {
            tracing::info!(remote_id, %updated, "Updated on {updated}");
            FetchOutcome::Success(updated)
        },
        Ok(Err(err)) => match &*err {
            RemoteErrorKind::Timeout => {
                tracing::info!(remote_id, "Connection timed out");
                FetchOutcome::TimedOut
            },
            RemoteErrorKind::NotFound(_) => {
                tracing::info!(remote_id, "Couldn't find update time");
                FetchOutcome::NotFound
            },
            other => {
                tracing::warn!(remote_id, error = %other, "Lookup failed; treating as not found");
                FetchOutcome::NotFound
            },
        },
        Err(_elapsed) => {
            tracing::info!(remote_id, ?timeout, "Connection timed out");
            FetchOutcome::TimedOut
        },
    };
    Fetched::new(item, outcome)
}

/// Looks up every identifier and returns the outcomes, index-aligned with
/// `identifiers`, calling `on_progress(done, total)` along the way (starting
/// with `(0, total)`).
///
/// The returned vector always has the same length as `identifiers`,
/// whether or not `cancel` fired.
pub async fn fetch_all<I>(
    lookup: &LookupHandle,
    identifiers: Vec<I>,
    mut on_progress: impl FnMut(usize, usize),
    cancel: CancellationToken,
    options: FetchOptions,
) -> Vec<FetchOutcome>
where
    I: Identified + Send,
{
    let mut events = pin!(fetch(lookup, identifiers, cancel, options));
    let mut outcomes = Vec::new();
    while let Some(event) = events.next().await {
        match event {
            FetchEvent::Progress { done, total } => on_progress(done, total),
            FetchEvent::Complete(fetched) | FetchEvent::Cancelled(fetched) => {
                outcomes = fetched.into_iter().map(|f| f.outcome).collect();
            },
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use blessforge_remote::backend::{MockLookup, MockResponse};
    use std::sync::Arc;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn handle(mock: &Arc<MockLookup>) -> LookupHandle {
        mock.clone()
    }

    fn at(seconds: i64) -> FetchOutcome {
        let MockResponse::Updated(updated) = MockResponse::at(seconds) else {
            unreachable!()
        };
        FetchOutcome::Success(updated)
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let mock = Arc::new(MockLookup::with_responses([("a", MockResponse::at(10)), ("b", MockResponse::at(20))]));
        let lookup = handle(&mock);
        let events: Vec<_> =
            fetch(&lookup, ids(&["a", "b"]), CancellationToken::new(), FetchOptions::default()).collect().await;
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], FetchEvent::Progress { done: 0, total: 2 }));
        assert!(matches!(events[1], FetchEvent::Progress { done: 1, total: 2 }));
        assert!(matches!(events[2], FetchEvent::Progress { done: 2, total: 2 }));
        let FetchEvent::Complete(fetched) = &events[3] else {
            panic!("expected completion, got {:?}", events[3]);
        };
        assert_eq!(fetched, &[Fetched::new("a".to_string(), at(10)), Fetched::new("b".to_string(), at(20))]);
        assert!(events[3].is_terminal());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let lookup: LookupHandle = Arc::new(MockLookup::default());
        let events: Vec<_> =
            fetch(&lookup, Vec::<String>::new(), CancellationToken::new(), FetchOptions::default()).collect().await;
        assert!(matches!(events[0], FetchEvent::Progress { done: 0, total: 0 }));
        assert!(matches!(&events[1], FetchEvent::Complete(fetched) if fetched.is_empty()));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_never_abort_the_batch() {
        let mock = Arc::new(MockLookup::with_responses([
            ("found", MockResponse::at(10)),
            ("gone", MockResponse::NotFound),
            ("slow", MockResponse::Timeout),
            ("broken", MockResponse::Transport("connection reset".to_string())),
        ]));
        let lookup = handle(&mock);
        let identifiers = ids(&["gone", "found", "slow", "unlisted", "broken", "found"]);
        let outcomes =
            fetch_all(&lookup, identifiers, |_, _| {}, CancellationToken::new(), FetchOptions::default()).await;
        assert_eq!(
            outcomes,
            [
                FetchOutcome::NotFound,
                at(10),
                FetchOutcome::TimedOut,
                FetchOutcome::NotFound,
                FetchOutcome::NotFound,
                at(10),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_timeout() {
        let mock = Arc::new(MockLookup::with_responses([
            ("slow", MockResponse::at(10).delayed(Duration::from_secs(60))),
            ("fast", MockResponse::at(20)),
        ]));
        let lookup = handle(&mock);
        let options = FetchOptions {
            timeout: Duration::from_secs(30),
            ..FetchOptions::default()
        };
        let outcomes = fetch_all(&lookup, ids(&["slow", "fast"]), |_, _| {}, CancellationToken::new(), options).await;
        assert_eq!(outcomes, [FetchOutcome::TimedOut, at(20)]);
    }

    #[tokio::test]
    async fn test_progress_reports() {
        let lookup: LookupHandle = Arc::new(MockLookup::default());
        let mut progress = Vec::new();
        let outcomes = fetch_all(
            &lookup,
            ids(&["a", "b", "c"]),
            |done, total| progress.push((done, total)),
            CancellationToken::new(),
            FetchOptions::default(),
        )
        .await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(progress, [(0, 3), (1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_cancel_after_two_of_five() {
        let mock = Arc::new(MockLookup::with_responses([
            ("a", MockResponse::at(1)),
            ("b", MockResponse::NotFound),
            ("c", MockResponse::at(3)),
            ("d", MockResponse::at(4)),
            ("e", MockResponse::at(5)),
        ]));
        let lookup = handle(&mock);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let outcomes = fetch_all(
            &lookup,
            ids(&["a", "b", "c", "d", "e"]),
            |done, _| {
                if done == 2 {
                    trigger.cancel();
                }
            },
            cancel,
            FetchOptions::default(),
        )
        .await;
        assert_eq!(
            outcomes,
            [
                at(1),
                FetchOutcome::NotFound,
                FetchOutcome::Cancelled,
                FetchOutcome::Cancelled,
                FetchOutcome::Cancelled,
            ]
        );
        assert_eq!(mock.calls(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mock = Arc::new(MockLookup::with_responses([("a", MockResponse::at(1))]));
        let lookup = handle(&mock);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let events: Vec<_> = fetch(&lookup, ids(&["a", "b"]), cancel, FetchOptions::default()).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], FetchEvent::Progress { done: 0, total: 2 }));
        let FetchEvent::Cancelled(fetched) = &events[1] else {
            panic!("expected cancellation, got {:?}", events[1]);
        };
        assert!(fetched.iter().all(|f| f.outcome == FetchOutcome::Cancelled));
        assert_eq!(fetched.iter().map(|f| f.item.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_results_keep_input_order() {
        // The first lookup finishes last, the last finishes first.
        let mock = Arc::new(MockLookup::with_responses([
            ("a", MockResponse::at(1).delayed(Duration::from_millis(300))),
            ("b", MockResponse::at(2).delayed(Duration::from_millis(200))),
            ("c", MockResponse::at(3).delayed(Duration::from_millis(100))),
        ]));
        let lookup = handle(&mock);
        let options = FetchOptions {
            concurrency: 3,
            ..FetchOptions::default()
        };
        let mut progress = Vec::new();
        let outcomes = fetch_all(
            &lookup,
            ids(&["a", "b", "c"]),
            |done, _| progress.push(done),
            CancellationToken::new(),
            options,
        )
        .await;
        assert_eq!(outcomes, [at(1), at(2), at(3)]);
        assert_eq!(progress, [0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrent_cancel_lets_in_flight_finish() {
        let mock = Arc::new(MockLookup::with_responses([
            ("a", MockResponse::at(1)),
            ("b", MockResponse::at(2)),
            ("c", MockResponse::at(3)),
            ("d", MockResponse::at(4)),
        ]));
        let lookup = handle(&mock);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let options = FetchOptions {
            concurrency: 2,
            ..FetchOptions::default()
        };
        let outcomes = fetch_all(
            &lookup,
            ids(&["a", "b", "c", "d"]),
            |done, _| {
                if done == 1 {
                    trigger.cancel();
                }
            },
            cancel,
            options,
        )
        .await;
        assert_eq!(outcomes, [at(1), at(2), FetchOutcome::Cancelled, FetchOutcome::Cancelled]);
        assert_eq!(mock.calls(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_clamped() {
        let lookup: LookupHandle = Arc::new(MockLookup::default());
        let options = FetchOptions {
            concurrency: 0,
            ..FetchOptions::default()
        };
        let outcomes = fetch_all(&lookup, ids(&["a"]), |_, _| {}, CancellationToken::new(), options).await;
        assert_eq!(outcomes, [FetchOutcome::NotFound]);
    }
}
