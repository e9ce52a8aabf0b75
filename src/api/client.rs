// src/api/client.rs
//! Thin HTTP client for the Notion API.
//!
//! Handles authentication and request/response plumbing; parsing lives in
//! `parser`.

use super::simple_pagination::{children_page_endpoint, fetch_all_pages_simple};
use crate::constants::{NOTION_API_BASE_URL, NOTION_API_VERSION};
use crate::error::AppError;
use crate::model::{Block, Page};
use crate::types::{ApiKey, BlockId, PageId};
use reqwest::{header, Client, Response};

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, NOTION_API_BASE_URL)
    }

    /// Creates a client against a different API root, e.g. a local mock.
    pub fn with_base_url(api_key: &ApiKey, base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Ok(Self { client, base_url })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Makes a GET request to `endpoint` (a path relative to the API root).
    pub async fn get(&self, endpoint: &str) -> Result<Response, AppError> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        log::debug!("{} -> {}", endpoint, response.status());
        Ok(response)
    }

    async fn get_text(&self, endpoint: &str) -> Result<ApiResponse<String>, AppError> {
        let response = self.get(endpoint).await?;
        extract_response_text(response).await
    }
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionHttpClient {
    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError> {
        let result = self.get_text(&format!("pages/{}", id.to_dashed())).await?;
        super::parser::parse_page_response(result)
    }

    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError> {
        let result = self.get_text(&format!("blocks/{}", id.to_dashed())).await?;
        super::parser::parse_block_response(result)
    }

    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError> {
        let base_endpoint = format!("blocks/{}/children", parent.to_dashed());
        let pagination_result = fetch_all_pages_simple(
            |page_size, cursor| {
                let endpoint = children_page_endpoint(&base_endpoint, page_size, cursor.as_deref());
                async move {
                    let result = self.get_text(&endpoint).await?;
                    super::parser::parse_blocks_pagination(result)
                }
            },
            None,
        )
        .await?;
        log::debug!(
            "Fetched {} children of {}",
            pagination_result.total_fetched,
            parent
        );
        Ok(pagination_result.items)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
