use crate::core::FeedSource;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Downloads the published sales sheet as CSV text.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    url: String,
    cache_bust: bool,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            cache_bust: true,
        }
    }

    /// Whether to append a `t=<millis>` query parameter so intermediate
    /// caches cannot serve a stale export.
    pub fn with_cache_bust(mut self, enabled: bool) -> Self {
        self.cache_bust = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Result<Self> {
        if let Some(timeout) = timeout {
            self.client = Client::builder().timeout(timeout).build()?;
        }
        Ok(self)
    }

    pub fn request_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| EtlError::InvalidConfigValueError {
            field: "feed_url".to_string(),
            value: self.url.clone(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        if self.cache_bust {
            url.query_pairs_mut()
                .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        }
        Ok(url)
    }
}

impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<String> {
        let url = self.request_url()?;
        tracing::debug!("Requesting sales feed: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("Feed response status: {}", status);

        if !status.is_success() {
            return Err(EtlError::FeedStatusError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        tracing::debug!("Received {} bytes of feed text", body.len());
        Ok(body)
    }
}
