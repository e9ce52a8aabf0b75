// src/api/types.rs
//! Wire-level types shared by the Notion API client and its parsers.

use serde::Deserialize;

/// Generic paginated list from the Notion API.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Error body returned by the Notion API alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionApiErrorResponse {
    #[serde(default)]
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Result of a pagination operation.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub total_fetched: usize,
}
