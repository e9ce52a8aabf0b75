// src/api/mod.rs
//! Notion API interaction: retrieving pages, blocks and block children.
//!
//! I/O lives in `client` and `cache`, status handling in `parser`, and the
//! lenient JSON-to-model conversion in `responses`.

pub mod cache;
pub mod client;
pub mod parser;
pub mod responses;
mod simple_pagination;
pub mod tree;
mod types;

use crate::error::AppError;
use crate::model::{Block, Page};
use crate::types::{BlockId, PageId};

/// The ability to retrieve content from a Notion workspace.
///
/// Business logic depends on this trait, never on HTTP details.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    /// The page object with its properties; `blocks` is left empty.
    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError>;
    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError>;
    /// Direct children of a block (or page), all pages of the listing.
    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError>;
}

// Re-export the public interface
pub use cache::{CacheKey, CachedNotionClient, DiskCache};
pub use client::{ApiResponse, NotionHttpClient};
pub use tree::{fetch_block_tree, fetch_page_tree};
pub use types::{PaginatedResponse, PaginationResult};
