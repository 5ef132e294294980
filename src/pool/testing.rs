//! Test doubles shared by the pool and dispatch tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::aggregator::Aggregator;
use super::extractor::RegexExtractor;
use super::fetcher::SourceFetcher;
use super::manager::PoolManager;
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::models::Source;

/// Returns the same replaceable body for every source
pub(crate) struct StaticFetcher {
    body: parking_lot::Mutex<String>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub(crate) fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: parking_lot::Mutex::new(body.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_body(&self, body: &str) {
        *self.body.lock() = body.to_string();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch(&self, _source: &Source) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.body.lock().clone())
    }
}

/// Every source is unreachable
pub(crate) struct DeadFetcher;

#[async_trait]
impl SourceFetcher for DeadFetcher {
    async fn fetch(&self, source: &Source) -> Result<String> {
        Err(PoolError::SourceFetch {
            source_url: source.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

/// A pool backed by a single fake source
pub(crate) fn pool_with(fetcher: Arc<dyn SourceFetcher>, config: &PoolConfig) -> PoolManager {
    let aggregator = Aggregator::new(
        fetcher,
        Arc::new(RegexExtractor::new()),
        vec![Source::parse("http://list.example/http.txt").unwrap()],
        Duration::from_secs(5),
    );
    PoolManager::new(Arc::new(aggregator), config)
}
