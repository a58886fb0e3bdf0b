// Raw manifest text retrieval: the fetcher collaborator trait and its
// default reqwest-backed implementation.

use crate::config::FetchConfig;
use crate::error::SchedulerError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Collaborator that retrieves raw manifest text. Retry and backoff policy
/// for manifest fetches is the caller's concern.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, SchedulerError>;
}

/// Default fetcher on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpManifestFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpManifestFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url_str: &str) -> Result<String, SchedulerError> {
        let url = Url::parse(url_str)
            .map_err(|e| SchedulerError::playlist(format!("invalid manifest URL {url_str}: {e}")))?;

        let response = self
            .client
            .get(url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SchedulerError::http_status(response.status(), url_str));
        }

        let text = response.text().await?;
        debug!(url = %url_str, bytes = text.len(), "fetched manifest");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_fails_before_any_request() {
        let fetcher = HttpManifestFetcher::new(Client::new(), FetchConfig::default());
        let res = fetcher.fetch("not a url").await;
        assert!(matches!(res, Err(SchedulerError::Playlist { .. })));
    }
}
