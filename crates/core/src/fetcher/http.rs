//! HTTP asset source.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::config::FetchConfig;
use super::error::FetchError;
use super::traits::AssetSource;
use crate::item::{AssetNaming, ItemId};
use crate::metrics;

/// Fetches assets with plain HTTP GET requests.
///
/// The timeout covers the whole exchange, body included.
pub struct HttpAssetSource {
    client: Client,
    base_url: String,
    naming: AssetNaming,
    timeout: Duration,
}

impl HttpAssetSource {
    /// Creates a source from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::build(
            &config.base_url,
            config.naming(),
            config.timeout(),
            &config.user_agent,
        )
    }

    /// Creates a source with an explicit timeout.
    pub fn build(
        base_url: &str,
        naming: AssetNaming,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            naming,
            timeout,
        })
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    fn name(&self) -> &str {
        "http"
    }

    fn locate(&self, item: ItemId) -> String {
        self.naming.remote_url(&self.base_url, item)
    }

    async fn retrieve(&self, item: ItemId) -> Result<Vec<u8>, FetchError> {
        let url = self.locate(item);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, self.timeout, e))?;

        metrics::BYTES_FETCHED.inc_by(body.len() as u64);
        Ok(body.to_vec())
    }
}
