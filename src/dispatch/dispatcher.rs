//! Request dispatch through pool-selected proxies
//!
//! One call pulls one address, uses it once and reports back. Retrying with a
//! different address is the caller's decision; `fetch_with_retry` is a helper
//! for callers that want the usual loop.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::Response;
use tokio::sync::broadcast;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::transport::{HttpProxyTransport, Transport};
use crate::config::{Config, DispatchConfig};
use crate::error::{PoolError, Result};
use crate::models::{Address, RequestRecord};
use crate::pool::PoolManager;

/// Performs HTTP GETs through proxies dispensed by a [`PoolManager`]
pub struct Dispatcher {
    pool: Arc<PoolManager>,
    transport: Arc<dyn Transport>,
    config: DispatchConfig,
    log_sender: Option<broadcast::Sender<RequestRecord>>,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<PoolManager>,
        transport: Arc<dyn Transport>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            pool,
            transport,
            config,
            log_sender: None,
        }
    }

    /// Dispatcher using the HTTP proxy transport and the configured timeouts
    pub fn from_config(pool: Arc<PoolManager>, config: &Config) -> Self {
        Self::new(
            pool,
            Arc::new(HttpProxyTransport::new()),
            config.dispatch.clone(),
        )
    }

    /// Publish a [`RequestRecord`] for every attempt on `sender`
    pub fn with_log_sender(mut self, sender: broadcast::Sender<RequestRecord>) -> Self {
        self.log_sender = Some(sender);
        self
    }

    pub fn pool(&self) -> &Arc<PoolManager> {
        &self.pool
    }

    /// GET `target` through one freshly acquired proxy
    ///
    /// Fails with [`PoolError::NoProxiesAvailable`] when the pool is empty, and
    /// with [`PoolError::ProxyFailed`] when the request through the acquired
    /// proxy did not complete; that failure is recorded against the proxy.
    #[instrument(skip(self))]
    pub async fn fetch(&self, target: &str) -> Result<Response<Bytes>> {
        let url = parse_target(target)?;
        self.fetch_url(&url).await
    }

    /// Like [`fetch`](Self::fetch), retrying with a new proxy up to the
    /// configured number of attempts
    pub async fn fetch_with_retry(&self, target: &str) -> Result<Response<Bytes>> {
        self.fetch_with_attempts(target, self.config.max_attempts)
            .await
    }

    /// Retry loop over fresh proxies
    ///
    /// Only proxy failures are retried. An empty pool or a bad target URL
    /// is returned immediately.
    #[instrument(skip(self))]
    pub async fn fetch_with_attempts(
        &self,
        target: &str,
        max_attempts: u32,
    ) -> Result<Response<Bytes>> {
        let url = parse_target(target)?;
        let max_attempts = max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.fetch_url(&url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!("{} (attempt {}/{})", e, attempt, max_attempts);
                }
                Err(e) => return Err(e),
            }
        }

        error!("All attempts failed after {} attempts", max_attempts);
        Err(PoolError::AllProxiesExhausted {
            attempts: max_attempts,
        })
    }

    async fn fetch_url(&self, url: &Url) -> Result<Response<Bytes>> {
        let address = self
            .pool
            .acquire()
            .await
            .ok_or(PoolError::NoProxiesAvailable)?;

        self.fetch_via(&address, url).await
    }

    async fn fetch_via(&self, address: &Address, url: &Url) -> Result<Response<Bytes>> {
        let timeout = self.config.request_timeout();
        debug!("Forwarding request through proxy {}", address);

        let start = Instant::now();
        let outcome =
            match tokio::time::timeout(timeout, self.transport.get(address, url, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(PoolError::Timeout),
            };
        let elapsed = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                self.broadcast_request_record(RequestRecord {
                    proxy_address: address.to_string(),
                    requested_url: url.to_string(),
                    success: true,
                    response_time: elapsed,
                    status_code: Some(response.status().as_u16()),
                    error_message: None,
                    timestamp: chrono::Utc::now(),
                });
                Ok(response)
            }
            Err(e) => {
                self.pool.report_failure(address).await;

                warn!("Request through {} failed: {}", address, e);
                self.broadcast_request_record(RequestRecord {
                    proxy_address: address.to_string(),
                    requested_url: url.to_string(),
                    success: false,
                    response_time: elapsed,
                    status_code: None,
                    error_message: Some(e.to_string()),
                    timestamp: chrono::Utc::now(),
                });

                Err(PoolError::ProxyFailed {
                    address: address.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn broadcast_request_record(&self, record: RequestRecord) {
        if let Some(sender) = &self.log_sender {
            let _ = sender.send(record);
        }
    }
}

/// Parse a target URL, accepting only http and https
fn parse_target(target: &str) -> Result<Url> {
    let url = Url::parse(target)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PoolError::InvalidRequest(format!(
            "unsupported scheme: {}",
            other
        ))),
    }
}
