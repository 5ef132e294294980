use url::Url;

use crate::error::{PoolError, Result};

/// Public proxy lists used when no sources are configured
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=all&ssl=all&anonymity=all",
    "https://raw.githubusercontent.com/mertguvencli/http-proxy-list/main/proxy-list/data.txt",
    "https://raw.githubusercontent.com/saschazesiger/Free-Proxies/master/proxies/http.txt",
    "https://github.com/jetkai/proxy-list/blob/main/online-proxies/txt/proxies-https.txt",
    "https://github.com/jetkai/proxy-list/blob/main/online-proxies/txt/proxies-http.txt",
    "https://github.com/BlackSnowDot/proxylist-update-every-minute/blob/main/https.txt",
    "https://github.com/BlackSnowDot/proxylist-update-every-minute/blob/main/http.txt",
    "https://raw.githubusercontent.com/UptimerBot/proxy-list/main/proxies/http.txt",
    "https://github.com/roosterkid/openproxylist/blob/main/HTTPS_RAW.txt",
    "https://raw.githubusercontent.com/monosans/proxy-list/main/proxies/http.txt",
    "https://raw.githubusercontent.com/proxy4parsing/proxy-list/main/http.txt",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/hyperbeats/proxy-list/main/http.txt",
    "https://raw.githubusercontent.com/mmpx12/proxy-list/master/http.txt",
    "https://sunny9577.github.io/proxy-scraper/proxies.txt",
    "https://www.proxy-list.download/api/v1/get?type=https",
    "https://www.proxy-list.download/api/v1/get?type=http",
    "https://www.proxyscan.io/download?type=https",
    "https://www.proxyscan.io/download?type=http",
    "https://api.openproxylist.xyz/http.txt",
    "http://pubproxy.com/api/proxy?limit=5",
    "https://openproxy.space/list/http",
    "https://www.juproxy.com/free_api",
];

/// A place candidate proxy addresses are scraped from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    pub url: Url,
}

impl Source {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| {
            PoolError::InvalidConfig(format!("invalid source URL {:?}: {}", raw, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Self { url }),
            other => Err(PoolError::InvalidConfig(format!(
                "source {} has unsupported scheme: {}",
                url, other
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The built-in list of public sources
    pub fn defaults() -> Vec<Source> {
        DEFAULT_SOURCES
            .iter()
            .filter_map(|raw| Source::parse(raw).ok())
            .collect()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
