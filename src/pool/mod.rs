//! Proxy pool
//!
//! This module provides the pool lifecycle:
//! - Fetching raw lists from sources and extracting candidate addresses
//! - Concurrent aggregation with deduplication
//! - Rotation without repetition until a cycle is exhausted
//! - Failure-driven retirement and automatic refill

pub mod aggregator;
pub mod extractor;
pub mod fetcher;
pub mod manager;
pub mod selection;

pub use aggregator::Aggregator;
pub use extractor::{AddressExtractor, RegexExtractor};
pub use fetcher::{HttpSourceFetcher, SourceFetcher};
pub use manager::PoolManager;
pub use selection::SelectionPolicy;

#[cfg(test)]
pub(crate) mod testing;
