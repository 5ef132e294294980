use crate::error::{PoolError, Result};
use crate::models::Source;
use crate::pool::SelectionPolicy;
use std::env;
use std::time::Duration;

/// Pool configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Pool manager configuration
    pub pool: PoolConfig,
    /// Source aggregation configuration
    pub aggregator: AggregatorConfig,
    /// Request dispatch configuration
    pub dispatch: DispatchConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Retire an address after strictly more than this many failures (default: 3)
    pub failure_threshold: u32,
    /// How to pick the next address from the available set
    pub selection: SelectionPolicy,
    /// Seconds between background full reloads, 0 disables (default: 0)
    pub reload_interval: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            selection: SelectionPolicy::Random,
            reload_interval: 0,
        }
    }
}

impl PoolConfig {
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval > 0).then(|| Duration::from_secs(self.reload_interval))
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Where candidate addresses are scraped from
    pub sources: Vec<Source>,
    /// Per-source fetch timeout in seconds (default: 30)
    pub fetch_timeout: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sources: Source::defaults(),
            fetch_timeout: 30,
        }
    }
}

impl AggregatorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Timeout for a request routed through a proxy, in seconds (default: 10)
    pub request_timeout: u64,
    /// Attempts made by the retrying fetch helper (default: 3)
    pub max_attempts: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout: 10,
            max_attempts: 3,
        }
    }
}

impl DispatchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            pool: PoolConfig {
                failure_threshold: get_env_or("POOL_FAILURE_THRESHOLD", "3")
                    .parse()
                    .map_err(|_| {
                        PoolError::InvalidConfig(
                            "POOL_FAILURE_THRESHOLD must be a valid number".into(),
                        )
                    })?,
                selection: parse_selection()?,
                reload_interval: get_env_or("POOL_RELOAD_INTERVAL", "0").parse().map_err(
                    |_| {
                        PoolError::InvalidConfig(
                            "POOL_RELOAD_INTERVAL must be a number of seconds".into(),
                        )
                    },
                )?,
            },
            aggregator: AggregatorConfig {
                sources: parse_sources()?,
                fetch_timeout: get_env_or("SOURCE_FETCH_TIMEOUT", "30")
                    .parse()
                    .map_err(|_| {
                        PoolError::InvalidConfig(
                            "SOURCE_FETCH_TIMEOUT must be a number of seconds".into(),
                        )
                    })?,
            },
            dispatch: DispatchConfig {
                request_timeout: get_env_or("DISPATCH_REQUEST_TIMEOUT", "10")
                    .parse()
                    .map_err(|_| {
                        PoolError::InvalidConfig(
                            "DISPATCH_REQUEST_TIMEOUT must be a number of seconds".into(),
                        )
                    })?,
                max_attempts: get_env_or("DISPATCH_MAX_ATTEMPTS", "3")
                    .parse()
                    .map_err(|_| {
                        PoolError::InvalidConfig(
                            "DISPATCH_MAX_ATTEMPTS must be a valid number".into(),
                        )
                    })?,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }
}

fn parse_selection() -> Result<SelectionPolicy> {
    let raw = get_env_or("POOL_SELECTION", "random");
    SelectionPolicy::parse(&raw).ok_or_else(|| {
        PoolError::InvalidConfig(format!(
            "POOL_SELECTION must be one of random, fifo (got {:?})",
            raw
        ))
    })
}

fn parse_sources() -> Result<Vec<Source>> {
    let raw = env::var("POOL_SOURCES").unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Source::defaults());
    }

    let mut sources: Vec<Source> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let source = Source::parse(part)?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    if sources.is_empty() {
        return Err(PoolError::InvalidConfig(
            "POOL_SOURCES must list at least one URL".into(),
        ));
    }

    Ok(sources)
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
