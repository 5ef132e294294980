use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a single request dispatched through a pooled proxy
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub proxy_address: String,
    pub requested_url: String,
    pub success: bool,
    /// Elapsed time in milliseconds
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}
