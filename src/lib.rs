//! Rota Pool - Self-healing proxy pool
//!
//! Keeps a rotating pool of public HTTP proxies scraped from many sources and
//! sends outbound requests through it.
//!
//! ## Features
//!
//! - Concurrent aggregation of candidate `ip:port` addresses from injectable sources
//! - Rotation without repetition until every known proxy has been handed out
//! - Failure counting with permanent retirement past a threshold
//! - Automatic refill of the rotation, and of the pool itself once it runs dry
//! - Request dispatch through a pool-selected proxy with a bounded timeout
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use rota_pool::{Config, Dispatcher, PoolManager};
//!
//! # async fn run() -> rota_pool::Result<()> {
//! let config = Config::from_env()?;
//! let pool = Arc::new(PoolManager::from_config(&config)?);
//! let dispatcher = Dispatcher::from_config(pool.clone(), &config);
//!
//! let response = dispatcher.fetch_with_retry("http://example.com/").await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod pool;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use dispatch::{Dispatcher, HttpProxyTransport, Transport};
pub use error::{PoolError, Result};
pub use models::{Address, PoolStats, RequestRecord, Source};
pub use pool::{Aggregator, PoolManager, SelectionPolicy};
