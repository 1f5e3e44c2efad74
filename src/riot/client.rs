use std::{fmt::Debug, sync::Arc};

use serde::de::DeserializeOwned;

use super::metrics::RequestMetrics;
use super::region::Region;
use super::types::{RiotApiError, RiotApiResponse};

/// HTTP client for the Riot REST API.
///
/// Quota is not enforced here: callers go through the shared
/// [`crate::rate_limit::RateLimiter`] before every request.
#[derive(Clone)]
pub struct RiotClient {
    client: reqwest::Client,
    /// Riot API Key
    key: String,
    base_url: String,
    metrics: Arc<RequestMetrics>,
}

impl Debug for RiotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiotClient")
            .field("base_url", &self.base_url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl RiotClient {
    pub fn new(key: String, region: Region, metrics: Arc<RequestMetrics>) -> Self {
        Self::with_base_url(key, region.base_url(), metrics)
    }

    /// Point the client at another host, e.g. a proxy or a mock server.
    pub fn with_base_url(key: String, base_url: String, metrics: Arc<RequestMetrics>) -> Self {
        Self {
            client: reqwest::Client::new(),
            key,
            base_url: base_url.trim_end_matches('/').to_string(),
            metrics,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned + Debug>(&self, url: &str) -> RiotApiResponse<T> {
        self.metrics.inc();

        let res = self
            .client
            .get(url)
            .header("X-Riot-Token", &self.key)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            tracing::debug!(%status, url, "🛰️ Riot API returned an error status");
            return Err(RiotApiError::Status(status));
        }

        res.json().await.map_err(RiotApiError::Reqwest)
    }
}
