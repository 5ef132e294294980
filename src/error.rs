use thiserror::Error;

/// Unified error type for the proxy pool
#[derive(Error, Debug)]
pub enum PoolError {
    // Source errors
    #[error("Source fetch failed for {source_url}: {reason}")]
    SourceFetch { source_url: String, reason: String },

    // Pool errors
    #[error("No proxies available")]
    NoProxiesAvailable,

    #[error("Request through proxy {address} failed: {reason}")]
    ProxyFailed { address: String, reason: String },

    #[error("All proxies exhausted after {attempts} attempts")]
    AllProxiesExhausted { attempts: u32 },

    #[error("Invalid proxy address: {0}")]
    InvalidProxyAddress(String),

    // Transport errors
    #[error("Proxy connection failed: {0}")]
    ProxyConnectionFailed(String),

    #[error("Operation timed out")]
    Timeout,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// True when the error was caused by a dispensed proxy (or the hop to it)
    pub fn is_proxy_failure(&self) -> bool {
        matches!(
            self,
            PoolError::ProxyFailed { .. } | PoolError::ProxyConnectionFailed(_) | PoolError::Timeout
        )
    }

    /// True when trying again with a freshly acquired address may succeed
    pub fn is_retryable(&self) -> bool {
        self.is_proxy_failure()
    }
}

// Convert from URL parse errors
impl From<url::ParseError> for PoolError {
    fn from(err: url::ParseError) -> Self {
        PoolError::InvalidRequest(err.to_string())
    }
}
