//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;
use crate::error::{PoolError, Result};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(config: &LogConfig) -> String {
    format!("rota_pool={}", config.level.to_lowercase())
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed or the format is unknown.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into());

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format.to_lowercase().as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "pretty" | "text" => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        other => {
            return Err(PoolError::InvalidConfig(format!(
                "LOG_FORMAT must be json or pretty (got {:?})",
                other
            )))
        }
    };

    installed.map_err(|e| {
        PoolError::Internal(format!("failed to install tracing subscriber: {}", e))
    })
}
