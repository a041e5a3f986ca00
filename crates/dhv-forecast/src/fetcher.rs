//! Retrieving the forecast page.

use std::time::Duration;

use async_trait::async_trait;
use dhv_core::{NetworkError, ReqwestErrorExt};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::debug;

/// Fetches the raw forecast document.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The response body as text. Must give up after `timeout`.
    async fn fetch(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<String, NetworkError>;
}

/// Plain HTTP GET over reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, NetworkError> {
        let client = Client::builder()
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<String, NetworkError> {
        let url = url::Url::parse(url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;
        debug!(%url, "Fetching forecast page");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?
            .error_for_status()
            .map_err(ReqwestErrorExt::into_network_error)?;

        let body = response
            .text()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;
        debug!(bytes = body.len(), "Fetched forecast page");
        Ok(body)
    }
}
