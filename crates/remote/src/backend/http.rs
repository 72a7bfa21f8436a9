//! HTTP lookup against the add-on site's project pages.

use crate::backend::{RemoteLookup, project_url};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use time::UtcDateTime;
use tracing::instrument;

/// A desktop browser user agent; the site serves a bot challenge to clients
/// that don't look like one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/102.0.5005.63 Safari/537.36";

/// Connection settings for [`HttpLookup`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub user_agent: String,
    /// Upper bound on a whole request, connect to last body byte.
    pub timeout: Duration,
}
impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Looks up last-updated timestamps by downloading each add-on's project page
/// (`{base_url}{remote_id}`) and extracting the timestamp from its HTML.
///
/// # Examples
///
/// ```no_run
/// use blessforge_remote::backend::{HttpLookup, HttpOptions};
/// use blessforge_remote::{RemoteLookup, Url};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let base = Url::parse("https://www.curseforge.com/wow/addons/")?;
/// let lookup = HttpLookup::new("curseforge", base, HttpOptions::default())?;
/// let updated = lookup.last_updated("details").await?;
/// println!("Details was last updated {updated}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpLookup {
    name: String,
    base_url: Url,
    client: Client,
}
impl HttpLookup {
    /// Create a new HTTP lookup.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUrl`](ErrorKind::InvalidUrl) if `base_url` is not an
    /// http(s) URL, or [`Transport`](ErrorKind::Transport) if the HTTP client
    /// cannot be initialised.
    pub fn new(name: impl Into<String>, base_url: Url, options: HttpOptions) -> Result<Self> {
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            exn::bail!(ErrorKind::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .build()
            .or_raise(|| ErrorKind::Transport("failed to initialise HTTP client".to_string()))?;
        Ok(Self {
            name: name.into(),
            base_url,
            client,
        })
    }
}

#[async_trait]
impl RemoteLookup for HttpLookup {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, remote_id: &str) -> Result<Url> {
        project_url(&self.base_url, remote_id)
    }

    #[instrument(skip(self), fields(lookup = %self.name))]
    async fn last_updated(&self, remote_id: &str) -> Result<UtcDateTime> {
        let url = self.url(remote_id)?;
        tracing::info!(%url, "Getting project page");
        let response = self.client.get(url).send().await.map_err(ErrorKind::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            exn::bail!(ErrorKind::NotFound(remote_id.to_string()));
        }
        let response = response.error_for_status().map_err(ErrorKind::from)?;
        let html = response.bytes().await.map_err(ErrorKind::from)?;
        let updated =
            blessforge_extract::last_updated(&html).or_raise(|| ErrorKind::NotFound(remote_id.to_string()))?;
        tracing::debug!(%updated, "Project page parsed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response per connection, forever.
    async fn serve(status: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buffer = vec![0; 4096];
                let _ = socket.read(&mut buffer).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        Url::parse(&format!("http://{address}/wow/addons/")).unwrap()
    }

    /// Accepts connections but never answers.
    async fn black_hole() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });
        Url::parse(&format!("http://{address}/")).unwrap()
    }

    fn lookup(base: Url, timeout: Duration) -> HttpLookup {
        let options = HttpOptions {
            timeout,
            ..HttpOptions::default()
        };
        HttpLookup::new("test", base, options).unwrap()
    }

    #[tokio::test]
    async fn test_parses_timestamp() {
        let base = serve("200 OK", r#"<html><abbr data-epoch="1654041600">Jun 1</abbr></html>"#).await;
        let updated = lookup(base, Duration::from_secs(5)).last_updated("details").await.unwrap();
        assert_eq!(updated.unix_timestamp(), 1654041600);
    }

    #[tokio::test]
    async fn test_missing_timestamp_is_not_found() {
        let base = serve("200 OK", "<html><p>Nothing here</p></html>").await;
        let err = lookup(base, Duration::from_secs(5)).last_updated("details").await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("details".to_string()));
    }

    #[tokio::test]
    async fn test_http_404_is_not_found() {
        let base = serve("404 Not Found", "").await;
        let err = lookup(base, Duration::from_secs(5)).last_updated("details").await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("details".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let base = serve("503 Service Unavailable", "").await;
        let err = lookup(base, Duration::from_secs(5)).last_updated("details").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Transport(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let base = black_hole().await;
        let err = lookup(base, Duration::from_millis(200)).last_updated("details").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Timeout);
    }

    #[test]
    fn test_rejects_non_http_base() {
        let base = Url::parse("ftp://example.com/addons/").unwrap();
        let err = HttpLookup::new("test", base, HttpOptions::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidUrl(_)));
    }

    #[test]
    fn test_url() {
        let base = Url::parse("https://www.curseforge.com/wow/addons/").unwrap();
        let lookup = HttpLookup::new("test", base, HttpOptions::default()).unwrap();
        assert_eq!(lookup.url("details").unwrap().as_str(), "https://www.curseforge.com/wow/addons/details");
    }
}
