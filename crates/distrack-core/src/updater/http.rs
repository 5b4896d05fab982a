//! Release manifest fetched over HTTP.

use std::future::Future;

use reqwest::Client;
use url::Url;

use super::{UpdateChecker, UpdateInfo};
use crate::error::UpdateError;

/// Reads `UpdateInfo` JSON from a fixed feed URL.
#[derive(Debug, Clone)]
pub struct HttpUpdateChecker {
    client: Client,
    feed: Url,
}

impl HttpUpdateChecker {
    /// # Errors
    /// Returns an error if `feed_url` is empty or not a valid URL.
    pub fn new(feed_url: &str) -> Result<Self, UpdateError> {
        if feed_url.trim().is_empty() {
            return Err(UpdateError::NotConfigured);
        }
        let feed = Url::parse(feed_url.trim()).map_err(|source| UpdateError::InvalidUrl {
            url: feed_url.to_string(),
            source,
        })?;
        Ok(Self {
            client: Client::new(),
            feed,
        })
    }

    pub fn feed(&self) -> &Url {
        &self.feed
    }

    async fn fetch(&self) -> Result<UpdateInfo, UpdateError> {
        tracing::debug!(feed = %self.feed, "fetching release manifest");
        let resp = self.client.get(self.feed.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UpdateError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        let info: UpdateInfo =
            serde_json::from_str(&body).map_err(|e| UpdateError::Manifest(e.to_string()))?;
        info.validate()?;
        Ok(info)
    }
}

impl UpdateChecker for HttpUpdateChecker {
    fn latest(&self) -> impl Future<Output = Result<UpdateInfo, UpdateError>> + Send {
        self.fetch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_feed_is_not_configured() {
        assert!(matches!(
            HttpUpdateChecker::new("  "),
            Err(UpdateError::NotConfigured)
        ));
    }

    #[test]
    fn malformed_feed_is_rejected() {
        assert!(matches!(
            HttpUpdateChecker::new("not a url"),
            Err(UpdateError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn valid_feed_is_kept() {
        let checker = HttpUpdateChecker::new("https://example.com/releases/latest.json").unwrap();
        assert_eq!(checker.feed().path(), "/releases/latest.json");
    }
}
