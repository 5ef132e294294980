//! Raw list retrieval from proxy sources

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{PoolError, Result};
use crate::models::Source;

/// Fetches the raw text published by a source
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Return the body of `source`, or an error on network failure,
    /// timeout or non-2xx status
    async fn fetch(&self, source: &Source) -> Result<String>;
}

/// Fetches sources over HTTP(S) with a direct connection
pub struct HttpSourceFetcher {
    client: reqwest::Client,
}

impl HttpSourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| PoolError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    #[instrument(skip_all, fields(source = %source))]
    async fn fetch(&self, source: &Source) -> Result<String> {
        let source_err = |reason: String| PoolError::SourceFetch {
            source_url: source.to_string(),
            reason,
        };

        let response = self
            .client
            .get(source.url.clone())
            .send()
            .await
            .map_err(|e| source_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(source_err(format!("unexpected status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| source_err(format!("failed to read body: {}", e)))?;

        debug!(bytes = body.len(), "Fetched source");
        Ok(body)
    }
}
