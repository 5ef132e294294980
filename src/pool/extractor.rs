//! Candidate address extraction from free text

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ADDRESS_PATTERN;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_PATTERN).expect("address pattern is valid"));

/// Pulls candidate `ip:port` strings out of raw source text
pub trait AddressExtractor: Send + Sync {
    /// Matches in the order they appear in `text`
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Best-effort pattern matcher for IPv4-literal `host:port` pairs
///
/// No hostnames, no IPv6, no range checks on octets or ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl AddressExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        ADDRESS_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
