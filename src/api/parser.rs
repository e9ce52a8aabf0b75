// src/api/parser.rs
//! Turns raw API responses into domain values.
//!
//! Status handling and error bodies live here; the per-object conversion
//! is in `responses`.

use super::client::ApiResponse;
use super::responses::{block_from_value, page_from_value};
use super::types::{NotionApiErrorResponse, PaginatedResponse};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use crate::model::{Block, Page};
use reqwest::StatusCode;
use serde_json::Value;

/// Parse any Notion API response body, mapping non-2xx statuses to errors.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_body(&result.data, &result.url)
    } else {
        Err(parse_error_body(&result.data, result.status, &result.url))
    }
}

fn parse_body<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
    })
}

fn preview(body: &str) -> String {
    if body.len() > ERROR_BODY_PREVIEW_LENGTH {
        let mut end = ERROR_BODY_PREVIEW_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

/// Builds the error for a non-2xx response, preferring Notion's own code.
pub fn parse_error_body(body: &str, status: StatusCode, url: &str) -> AppError {
    if let Ok(notion_error) = serde_json::from_str::<NotionApiErrorResponse>(body) {
        log::debug!(
            "Notion error {} ({}) for {}, request {:?}",
            notion_error.code,
            notion_error.status,
            url,
            notion_error.request_id
        );
        return AppError::NotionService {
            code: NotionErrorCode::from_api_response(&notion_error.code),
            message: notion_error.message,
            status,
        };
    }

    AppError::NotionService {
        code: NotionErrorCode::from_http_status(status.as_u16()),
        message: format!("HTTP {} from {}", status, url),
        status,
    }
}

/// Parse a `GET pages/{id}` response. The page's blocks are not included.
pub fn parse_page_response(result: ApiResponse<String>) -> Result<Page, AppError> {
    let value: Value = parse_api_response(result)?;
    page_from_value(&value)
}

/// Parse a `GET blocks/{id}` response.
pub fn parse_block_response(result: ApiResponse<String>) -> Result<Block, AppError> {
    let value: Value = parse_api_response(result)?;
    if !value.is_object() {
        return Err(AppError::MalformedResponse(
            "Block response is not an object".to_string(),
        ));
    }
    Ok(block_from_value(value))
}

/// Parse one page of a `GET blocks/{id}/children` listing.
pub fn parse_blocks_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Block>, AppError> {
    let response: PaginatedResponse<Value> = parse_api_response(result)?;

    Ok(PaginatedResponse {
        object: response.object,
        results: response.results.into_iter().map(block_from_value).collect(),
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    })
}
