//! Periodic pool reload service
//!
//! Rebuilds the whole pool from the sources on a fixed interval so retired
//! addresses and stale lists get replaced without waiting for the pool to
//! drain.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{info, instrument, warn};

use crate::config::PoolConfig;
use crate::pool::PoolManager;

/// Pool reload service configuration
#[derive(Clone)]
pub struct PoolReloadConfig {
    /// Time between full reloads
    pub reload_interval: Duration,
    /// Load once immediately when the service starts
    pub load_on_start: bool,
}

impl Default for PoolReloadConfig {
    fn default() -> Self {
        Self {
            reload_interval: Duration::from_secs(1800),
            load_on_start: true,
        }
    }
}

impl PoolReloadConfig {
    /// Service config for `pool`, or `None` when periodic reloads are disabled
    pub fn from_pool_config(pool: &PoolConfig) -> Option<Self> {
        pool.reload_interval().map(|reload_interval| Self {
            reload_interval,
            ..Self::default()
        })
    }
}

/// Pool reload service
pub struct PoolReloadService {
    pool: Arc<PoolManager>,
    config: PoolReloadConfig,
}

impl PoolReloadService {
    pub fn new(pool: Arc<PoolManager>, config: PoolReloadConfig) -> Self {
        Self { pool, config }
    }

    /// Run the reload loop until `shutdown` flips to true or its sender is dropped
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting pool reload service (interval: {}s)",
            self.config.reload_interval.as_secs()
        );

        if self.config.load_on_start {
            self.reload().await;
        }

        let mut ticker = interval(self.config.reload_interval);
        ticker.tick().await; // Skip immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reload().await;
                }
                changed = shutdown.changed() => {
                    // Sender dropped: no shutdown signal can arrive anymore
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Pool reload service shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn reload(&self) {
        let loaded = self.pool.bulk_load().await;
        if loaded == 0 {
            warn!("Scheduled reload found no proxies; pool is empty until the next load");
        } else {
            info!(count = loaded, "Reloaded proxy pool");
        }
    }
}

/// Handle for managing the pool reload service
pub struct PoolReloadHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl PoolReloadHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx }, rx)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Default for PoolReloadHandle {
    fn default() -> Self {
        Self::new().0
    }
}
