use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{PoolError, Result};

/// Pattern a proxy address must match: IPv4 literal host and a port.
///
/// Octet and port ranges are not checked, so `999.999.999.999:99999` is
/// accepted. Reachability is only known once the address is used.
pub const ADDRESS_PATTERN: &str = r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}:[0-9]{1,5}";

static FULL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}$", ADDRESS_PATTERN)).expect("address pattern is valid")
});

/// A proxy endpoint in `ip:port` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and syntactically validate an address
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if FULL_ADDRESS.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(PoolError::InvalidProxyAddress(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host part (everything before the last `:`)
    pub fn host(&self) -> &str {
        self.0.rsplit_once(':').map(|(h, _)| h).unwrap_or(&self.0)
    }

    /// Port part as written, without range validation
    pub fn port(&self) -> &str {
        self.0.rsplit_once(':').map(|(_, p)| p).unwrap_or("")
    }

    /// URL used to route plain HTTP proxy traffic through this address
    pub fn proxy_url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = PoolError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
