//! Scripted lookup for testing.

use crate::backend::{RemoteLookup, project_url};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use time::UtcDateTime;

/// What a [`MockLookup`] answers for a given identifier.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Updated(UtcDateTime),
    NotFound,
    Timeout,
    Transport(String),
    /// Panic inside the lookup, like a broken implementation would.
    Panic,
    /// Sleep (on the Tokio timer) before answering with the inner response.
    Delayed(Duration, Box<MockResponse>),
}
impl MockResponse {
    /// Shorthand for an [`Updated`](Self::Updated) response at a Unix timestamp.
    ///
    /// Panics on out-of-range timestamps; test setup is expected to be valid.
    pub fn at(unix_seconds: i64) -> Self {
        let Ok(updated) = UtcDateTime::from_unix_timestamp(unix_seconds) else {
            panic!("MockResponse::at: timestamp out of range: {unix_seconds}");
        };
        Self::Updated(updated)
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

/// In-memory lookup for testing.
///
/// Identifiers without a scripted response answer
/// [`NotFound`](ErrorKind::NotFound). Every call is recorded, in call order.
///
/// # Examples
///
/// ```
/// use blessforge_remote::backend::{MockLookup, MockResponse};
/// use blessforge_remote::RemoteLookup;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let lookup = MockLookup::with_responses([
///     ("details", MockResponse::at(1_654_041_600)),
///     ("weakauras-2", MockResponse::Timeout),
/// ]);
/// assert_eq!(lookup.last_updated("details").await.unwrap().unix_timestamp(), 1_654_041_600);
/// assert!(lookup.last_updated("weakauras-2").await.is_err());
/// assert_eq!(lookup.calls(), ["details", "weakauras-2"]);
/// # }
/// ```
pub struct MockLookup {
    name: String,
    base_url: Url,
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<String>>,
}
impl MockLookup {
    pub fn with_responses(responses: impl IntoIterator<Item = (impl Into<String>, MockResponse)>) -> Self {
        let Ok(base_url) = Url::parse("https://addons.invalid/") else {
            unreachable!("static mock base URL is valid");
        };
        Self {
            name: "mock".to_string(),
            base_url,
            responses: responses.into_iter().map(|(id, response)| (id.into(), response)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Identifiers looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn answer(&self, remote_id: &str, response: MockResponse) -> Result<UtcDateTime> {
        let mut response = response;
        while let MockResponse::Delayed(delay, inner) = response {
            tokio::time::sleep(delay).await;
            response = *inner;
        }
        match response {
            MockResponse::Updated(updated) => Ok(updated),
            MockResponse::NotFound => exn::bail!(ErrorKind::NotFound(remote_id.to_string())),
            MockResponse::Timeout => exn::bail!(ErrorKind::Timeout),
            MockResponse::Transport(message) => exn::bail!(ErrorKind::Transport(message)),
            MockResponse::Panic => panic!("MockLookup: scripted panic for {remote_id}"),
            MockResponse::Delayed(..) => unreachable!("delays are unwrapped above"),
        }
    }
}
impl Default for MockLookup {
    fn default() -> Self {
        let responses: [(&str, MockResponse); 0] = [];
        Self::with_responses(responses)
    }
}

#[async_trait]
impl RemoteLookup for MockLookup {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, remote_id: &str) -> Result<Url> {
        project_url(&self.base_url, remote_id)
    }

    async fn last_updated(&self, remote_id: &str) -> Result<UtcDateTime> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(remote_id.to_string());
        let response = self.responses.get(remote_id).cloned().unwrap_or(MockResponse::NotFound);
        self.answer(remote_id, response).await
    }
}
