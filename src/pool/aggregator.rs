//! Concurrent aggregation of candidate addresses across all sources

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::extractor::AddressExtractor;
use super::fetcher::SourceFetcher;
use crate::error::PoolError;
use crate::models::{Address, Source};

/// Fans fetch + extract out across sources and merges the results
///
/// A dead source contributes nothing; it never aborts the whole collection.
pub struct Aggregator {
    fetcher: Arc<dyn SourceFetcher>,
    extractor: Arc<dyn AddressExtractor>,
    sources: Vec<Source>,
    fetch_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        extractor: Arc<dyn AddressExtractor>,
        sources: Vec<Source>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            sources,
            fetch_timeout,
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Collect the deduplicated candidate set from the configured sources
    pub async fn collect(&self) -> HashSet<Address> {
        self.collect_from(&self.sources).await
    }

    /// Collect the deduplicated candidate set from `sources`
    ///
    /// One task per source; waits for every task before returning. Dropping
    /// the returned future aborts the fetches still running.
    #[instrument(skip(self, sources), fields(sources = sources.len()))]
    pub async fn collect_from(&self, sources: &[Source]) -> HashSet<Address> {
        let merged: Arc<Mutex<HashSet<Address>>> = Arc::new(Mutex::new(HashSet::new()));

        let mut tasks = JoinSet::new();
        for source in sources.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();
            let merged = merged.clone();
            let fetch_timeout = self.fetch_timeout;

            tasks.spawn(async move {
                let found =
                    collect_source(fetcher.as_ref(), extractor.as_ref(), &source, fetch_timeout)
                        .await;
                let contributed = found.len();
                merged.lock().extend(found);
                contributed
            });
        }

        let mut failed_tasks = 0usize;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                failed_tasks += 1;
                error!("Source task aborted: {}", e);
            }
        }

        let merged = std::mem::take(&mut *merged.lock());
        info!(
            unique = merged.len(),
            failed_tasks, "Aggregated candidate proxies"
        );
        merged
    }
}

/// Fetch and extract a single source, degrading every failure to an empty result
async fn collect_source(
    fetcher: &dyn SourceFetcher,
    extractor: &dyn AddressExtractor,
    source: &Source,
    fetch_timeout: Duration,
) -> Vec<Address> {
    let body = match tokio::time::timeout(fetch_timeout, fetcher.fetch(source)).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            warn!(source = %source, error = %e, "Source fetch failed, skipping");
            return Vec::new();
        }
        Err(_) => {
            warn!(source = %source, error = %PoolError::Timeout, "Source fetch timed out, skipping");
            return Vec::new();
        }
    };

    let addresses: Vec<Address> = extractor
        .extract(&body)
        .into_iter()
        .filter_map(|raw| match Address::parse(&raw) {
            Ok(addr) => Some(addr),
            Err(e) => {
                debug!(source = %source, "Dropping candidate: {}", e);
                None
            }
        })
        .collect();

    debug!(source = %source, count = addresses.len(), "Extracted candidates");
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::pool::extractor::RegexExtractor;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Serves canned bodies by URL; unknown URLs fail
    struct MapFetcher {
        bodies: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MapFetcher {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                bodies: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceFetcher for MapFetcher {
        async fn fetch(&self, source: &Source) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(source.as_str())
                .cloned()
                .ok_or_else(|| PoolError::SourceFetch {
                    source_url: source.to_string(),
                    reason: "connection refused".to_string(),
                })
        }
    }

    struct HangingFetcher;

    #[async_trait]
    impl SourceFetcher for HangingFetcher {
        async fn fetch(&self, _source: &Source) -> Result<String> {
            std::future::pending::<Result<String>>().await
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl SourceFetcher for PanickingFetcher {
        async fn fetch(&self, source: &Source) -> Result<String> {
            if source.as_str().contains("boom") {
                panic!("fetcher blew up");
            }
            Ok("7.7.7.7:7777".to_string())
        }
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Never finishes; flags when its in-flight fetch is dropped
    struct StuckFetcher {
        cancelled: Arc<AtomicBool>,
    }

    #[async_trait]
    impl SourceFetcher for StuckFetcher {
        async fn fetch(&self, _source: &Source) -> Result<String> {
            let _guard = SetOnDrop(self.cancelled.clone());
            std::future::pending::<Result<String>>().await
        }
    }

    fn sources(urls: &[&str]) -> Vec<Source> {
        urls.iter().map(|u| Source::parse(u).unwrap()).collect()
    }

    fn aggregator(fetcher: Arc<dyn SourceFetcher>, urls: &[&str]) -> Aggregator {
        Aggregator::new(
            fetcher,
            Arc::new(RegexExtractor::new()),
            sources(urls),
            Duration::from_secs(5),
        )
    }

    fn addr(raw: &str) -> Address {
        Address::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_collect_deduplicates_across_and_within_sources() {
        let fetcher = Arc::new(MapFetcher::new(&[
            ("http://a.example/", "1.2.3.4:80\n1.2.3.4:80\n5.6.7.8:8080"),
            ("http://b.example/", "5.6.7.8:8080 9.9.9.9:3128"),
        ]));
        let agg = aggregator(fetcher.clone(), &["http://a.example/", "http://b.example/"]);

        let result = agg.collect().await;

        let expected: HashSet<Address> = ["1.2.3.4:80", "5.6.7.8:8080", "9.9.9.9:3128"]
            .into_iter()
            .map(addr)
            .collect();
        assert_eq!(result, expected);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collect_failed_source_contributes_nothing() {
        let fetcher = Arc::new(MapFetcher::new(&[("http://up.example/", "1.2.3.4:80")]));
        let agg = aggregator(fetcher, &["http://down.example/", "http://up.example/"]);

        let result = agg.collect().await;
        assert_eq!(result, HashSet::from([addr("1.2.3.4:80")]));
    }

    #[tokio::test]
    async fn test_collect_all_sources_failing_yields_empty_set() {
        let fetcher = Arc::new(MapFetcher::new(&[]));
        let agg = aggregator(fetcher, &["http://a.example/", "http://b.example/"]);
        assert!(agg.collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_collect_no_sources() {
        let fetcher = Arc::new(MapFetcher::new(&[]));
        let agg = aggregator(fetcher.clone(), &[]);
        assert!(agg.collect().await.is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_collect_from_explicit_sources() {
        let fetcher = Arc::new(MapFetcher::new(&[
            ("http://a.example/", "1.2.3.4:80"),
            ("http://b.example/", "5.6.7.8:8080"),
        ]));
        let agg = aggregator(fetcher, &["http://a.example/"]);

        let result = agg.collect_from(&sources(&["http://b.example/"])).await;
        assert_eq!(result, HashSet::from([addr("5.6.7.8:8080")]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_times_out_slow_source() {
        let agg = Aggregator::new(
            Arc::new(HangingFetcher),
            Arc::new(RegexExtractor::new()),
            sources(&["http://slow.example/"]),
            Duration::from_secs(30),
        );

        assert!(agg.collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_collect_survives_panicking_task() {
        let agg = aggregator(
            Arc::new(PanickingFetcher),
            &["http://boom.example/", "http://fine.example/"],
        );

        let result = agg.collect().await;
        assert_eq!(result, HashSet::from([addr("7.7.7.7:7777")]));
    }

    #[tokio::test]
    async fn test_dropping_collect_aborts_source_tasks() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let agg = Aggregator::new(
            Arc::new(StuckFetcher {
                cancelled: cancelled.clone(),
            }),
            Arc::new(RegexExtractor::new()),
            sources(&["http://stuck.example/"]),
            Duration::from_secs(3600),
        );

        let abandoned = tokio::time::timeout(Duration::from_millis(50), agg.collect()).await;
        assert!(abandoned.is_err());

        let aborted = tokio::time::timeout(Duration::from_secs(5), async {
            while !cancelled.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(aborted.is_ok(), "source task outlived the dropped collect");
    }
}
