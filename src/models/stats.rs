use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time view of the pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Addresses in the known pool
    pub known: usize,
    /// Addresses not yet dispensed in the current cycle
    pub available: usize,
    /// Addresses retired since the last full load
    pub retired: u64,
    /// Number of times the available set has been refilled
    pub cycles: u64,
    /// Size of the last load from the aggregator
    pub last_load_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_loaded_at: Option<DateTime<Utc>>,
}

impl PoolStats {
    pub fn is_empty(&self) -> bool {
        self.known == 0
    }
}
