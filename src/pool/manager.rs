//! Pool lifecycle management
//!
//! The manager owns two views of the pool:
//!
//! - the known pool: every address considered possibly usable, with a failure counter
//! - the available set: addresses not yet dispensed in the current rotation cycle
//!
//! The available set is refilled from the known pool only once it is empty, and
//! the known pool is refilled from the aggregator only once it is empty. Every
//! operation runs as a single critical section over both.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::aggregator::Aggregator;
use super::extractor::RegexExtractor;
use super::fetcher::HttpSourceFetcher;
use super::selection::{AvailableSet, SelectionPolicy};
use crate::config::{Config, PoolConfig};
use crate::error::Result;
use crate::models::{Address, PoolStats};

#[derive(Debug, Default)]
struct PoolState {
    known: HashMap<Address, u32>,
    available: AvailableSet,
    retired: u64,
    cycles: u64,
    last_load_count: usize,
    last_loaded_at: Option<chrono::DateTime<Utc>>,
}

impl PoolState {
    /// Replace the known pool with `candidates`, all at zero failures
    fn load(&mut self, candidates: HashSet<Address>) {
        self.known = candidates.into_iter().map(|addr| (addr, 0)).collect();
        self.available.clear();
        self.retired = 0;
        self.last_load_count = self.known.len();
        self.last_loaded_at = Some(Utc::now());
    }

    /// Start a new rotation cycle from the current known pool
    fn refill_available(&mut self) {
        self.available.refill(self.known.keys().cloned());
        self.cycles += 1;
    }

    /// Take the next address of the cycle that has not been retired meanwhile
    fn take_live(&mut self, policy: SelectionPolicy) -> Option<Address> {
        while let Some(addr) = self.available.take(policy) {
            if self.known.contains_key(&addr) {
                return Some(addr);
            }
            debug!(address = %addr, "Skipping retired proxy");
        }
        None
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            known: self.known.len(),
            available: self.available.len(),
            retired: self.retired,
            cycles: self.cycles,
            last_load_count: self.last_load_count,
            last_loaded_at: self.last_loaded_at,
        }
    }
}

/// Single authority over the known pool and the available set
pub struct PoolManager {
    aggregator: Arc<Aggregator>,
    state: Mutex<PoolState>,
    failure_threshold: u32,
    selection: SelectionPolicy,
}

impl PoolManager {
    pub fn new(aggregator: Arc<Aggregator>, config: &PoolConfig) -> Self {
        Self {
            aggregator,
            state: Mutex::new(PoolState::default()),
            failure_threshold: config.failure_threshold,
            selection: config.selection,
        }
    }

    /// Build a manager that scrapes the configured sources over HTTP
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpSourceFetcher::new(config.aggregator.fetch_timeout())?;
        let aggregator = Aggregator::new(
            Arc::new(fetcher),
            Arc::new(RegexExtractor::new()),
            config.aggregator.sources.clone(),
            config.aggregator.fetch_timeout(),
        );

        Ok(Self::new(Arc::new(aggregator), &config.pool))
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn selection(&self) -> SelectionPolicy {
        self.selection
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Hand out one address not yet dispensed in the current cycle
    ///
    /// Refills the cycle from the known pool when it is exhausted, and the
    /// known pool from the aggregator when that is empty too. Returns `None`
    /// when no candidates exist anywhere; callers should back off before
    /// asking again.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Option<Address> {
        let mut state = self.state.lock().await;

        if let Some(addr) = state.take_live(self.selection) {
            debug!(address = %addr, remaining = state.available.len(), "Dispensed proxy");
            return Some(addr);
        }

        if state.known.is_empty() {
            info!("No proxies known, aggregating sources");
            // Held across the fetch so concurrent callers wait for this load
            // instead of starting their own.
            let candidates = self.aggregator.collect().await;
            state.load(candidates);
        } else {
            info!(known = state.known.len(), "Rotation cycle exhausted, refilling");
        }

        if state.known.is_empty() {
            warn!("No proxies available after aggregation");
            return None;
        }

        state.refill_available();
        let addr = state.take_live(self.selection)?;
        debug!(address = %addr, remaining = state.available.len(), "Dispensed proxy");
        Some(addr)
    }

    /// Record a failed use of `addr`, retiring it past the threshold
    ///
    /// Unknown or already retired addresses are ignored.
    #[instrument(skip(self), fields(address = %addr))]
    pub async fn report_failure(&self, addr: &Address) {
        let mut state = self.state.lock().await;

        let Some(failures) = state.known.get_mut(addr) else {
            debug!("Failure reported for unknown proxy, ignoring");
            return;
        };

        *failures += 1;
        let failures = *failures;

        if failures > self.failure_threshold {
            state.known.remove(addr);
            state.retired += 1;
            info!(failures, known = state.known.len(), "Retired proxy");
        } else {
            debug!(failures, "Recorded proxy failure");
        }
    }

    /// Replace the whole pool with a fresh aggregation
    ///
    /// Every address starts a new cycle at zero failures; prior failure
    /// history is discarded. Returns the number of addresses loaded.
    #[instrument(skip(self))]
    pub async fn bulk_load(&self) -> usize {
        let candidates = self.aggregator.collect().await;

        let mut state = self.state.lock().await;
        state.load(candidates);
        state.refill_available();

        let loaded = state.known.len();
        if loaded == 0 {
            warn!("Bulk load found no proxies");
        } else {
            info!(loaded, "Bulk loaded proxy pool");
        }
        loaded
    }

    pub async fn stats(&self) -> PoolStats {
        self.state.lock().await.stats()
    }

    pub async fn known_len(&self) -> usize {
        self.state.lock().await.known.len()
    }

    pub async fn available_len(&self) -> usize {
        self.state.lock().await.available.len()
    }

    /// Recorded failures for `addr`, or `None` if it is not in the known pool
    pub async fn failure_count(&self, addr: &Address) -> Option<u32> {
        self.state.lock().await.known.get(addr).copied()
    }

    /// Snapshot of the known pool, sorted
    pub async fn known_addresses(&self) -> Vec<Address> {
        let mut addrs: Vec<Address> = self.state.lock().await.known.keys().cloned().collect();
        addrs.sort();
        addrs
    }
}
