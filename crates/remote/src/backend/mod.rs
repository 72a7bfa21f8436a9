//! Remote lookup trait and implementations.

mod http;
#[cfg(feature = "mock")]
mod mock;

pub use self::http::{DEFAULT_USER_AGENT, HttpLookup, HttpOptions};
#[cfg(feature = "mock")]
pub use self::mock::{MockLookup, MockResponse};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use reqwest::Url;
use time::UtcDateTime;

/// Unified interface for finding out when an add-on was last updated.
///
/// Implementations may fail per identifier; callers decide whether a failure
/// aborts anything (the fetch worker never lets one identifier fail a batch).
///
/// # Examples
///
/// ```
/// use blessforge_remote::{RemoteLookup, error::Result};
/// use time::UtcDateTime;
///
/// async fn is_newer(lookup: &dyn RemoteLookup, remote_id: &str, local: UtcDateTime) -> Result<bool> {
///     Ok(lookup.last_updated(remote_id).await? > local)
/// }
/// ```
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    /// Name of the lookup (used for logging only).
    fn name(&self) -> &str;

    /// Human-facing URL of the add-on's project page.
    fn url(&self, remote_id: &str) -> Result<Url>;

    /// Fetch the last-updated timestamp for `remote_id`.
    ///
    /// # Errors
    /// - [`NotFound`](ErrorKind::NotFound) when the page or its timestamp is missing,
    /// - [`Timeout`](ErrorKind::Timeout) when the remote doesn't answer in time,
    /// - [`Transport`](ErrorKind::Transport) for anything else on the wire.
    async fn last_updated(&self, remote_id: &str) -> Result<UtcDateTime>;
}

/// Appends `remote_id` as the final path segment of `base`.
pub(crate) fn project_url(base: &Url, remote_id: &str) -> Result<Url> {
    if remote_id.is_empty() || remote_id.contains(['/', '?', '#']) {
        exn::bail!(ErrorKind::InvalidUrl(remote_id.to_string()));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ErrorKind::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push(remote_id);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.curseforge.com/wow/addons/", "details", "https://www.curseforge.com/wow/addons/details")]
    #[case("https://www.curseforge.com/wow/addons", "details", "https://www.curseforge.com/wow/addons/details")]
    #[case("http://127.0.0.1:8080/", "weakauras-2", "http://127.0.0.1:8080/weakauras-2")]
    fn test_project_url(#[case] base: &str, #[case] remote_id: &str, #[case] expected: &str) {
        let base = Url::parse(base).unwrap();
        assert_eq!(project_url(&base, remote_id).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("a/b")]
    #[case("a?b")]
    #[case("a#b")]
    fn test_project_url_rejects(#[case] remote_id: &str) {
        let base = Url::parse(crate::DEFAULT_BASE_URL).unwrap();
        let err = project_url(&base, remote_id).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidUrl(_)));
    }
}
