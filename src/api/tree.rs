// src/api/tree.rs
//! Assembles a page's full block tree by attaching children to every block
//! that reports having them.

use super::NotionRepository;
use crate::constants::NOTION_MAX_FETCH_DEPTH;
use crate::error::AppError;
use crate::model::{Block, Page};
use crate::types::{BlockId, PageId};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

/// How many sibling subtrees are fetched at once.
const SIBLING_FETCH_CONCURRENCY: usize = 4;

/// Fetches a page and its complete block tree.
pub async fn fetch_page_tree(repo: &dyn NotionRepository, id: &PageId) -> Result<Page, AppError> {
    let mut page = repo.retrieve_page(id).await?;
    log::info!("Fetched page '{}' ({})", page.title, page.id);
    page.blocks = fetch_block_tree(repo, &id.as_block_id(), NOTION_MAX_FETCH_DEPTH).await?;
    Ok(page)
}

/// Fetches the children of `parent`, then recursively the children of every
/// child that has any. Sibling order is preserved.
///
/// A failure below the top level is logged and leaves that subtree empty.
pub async fn fetch_block_tree(
    repo: &dyn NotionRepository,
    parent: &BlockId,
    max_depth: u8,
) -> Result<Vec<Block>, AppError> {
    let children = repo.retrieve_children(parent).await?;
    Ok(attach_children(repo, children, max_depth.saturating_sub(1)).await)
}

fn attach_children<'a>(
    repo: &'a dyn NotionRepository,
    blocks: Vec<Block>,
    depth_remaining: u8,
) -> BoxFuture<'a, Vec<Block>> {
    async move {
        futures::stream::iter(blocks)
            .map(|block| attach_subtree(repo, block, depth_remaining))
            .buffered(SIBLING_FETCH_CONCURRENCY)
            .collect()
            .await
    }
    .boxed()
}

async fn attach_subtree(repo: &dyn NotionRepository, mut block: Block, depth_remaining: u8) -> Block {
    if !block.has_children() || !block.children().is_empty() {
        return block;
    }
    if depth_remaining == 0 {
        log::warn!(
            "Not descending into {} ({}): nesting limit reached",
            block.id(),
            block.block_type()
        );
        return block;
    }

    match repo.retrieve_children(block.id()).await {
        Ok(children) => {
            let children = attach_children(repo, children, depth_remaining - 1).await;
            block.set_children(children);
        }
        Err(e) => {
            log::warn!("Failed to fetch children of {}: {}", block.id(), e);
        }
    }
    block
}
