//! Background services

pub mod pool_reload;

pub use pool_reload::{PoolReloadConfig, PoolReloadHandle, PoolReloadService};
