//! Asking the origin for a freshly signed asset URL.

use super::{AssetOwner, AssetReference};
use crate::api::NotionRepository;
use crate::error::AppError;
use crate::model::Block;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A renewed URL for an asset owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedAsset {
    pub url: String,
    pub expiry_time: Option<DateTime<Utc>>,
}

impl RefreshedAsset {
    /// The asset carried by a freshly retrieved block, if it has a usable URL.
    pub fn from_block(block: &Block) -> Option<Self> {
        let reference = AssetReference::from_block(block)?;
        Self::from_reference(reference)
    }

    fn from_reference(reference: AssetReference) -> Option<Self> {
        if reference.url.is_empty() {
            return None;
        }
        Some(Self {
            url: reference.url,
            expiry_time: reference.expiry_time,
        })
    }
}

/// Why a refresh attempt produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error("origin answered HTTP {0}")]
    Status(u16),

    #[error("malformed origin response: {0}")]
    Malformed(String),
}

impl RefreshError {
    /// Only failures below HTTP are worth a second attempt. An answer from
    /// the origin, good or bad, is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RefreshError::Transport(_) | RefreshError::Timeout(_))
    }
}

impl From<AppError> for RefreshError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Timeout { seconds, .. } => RefreshError::Timeout(Duration::from_secs(seconds)),
            e if e.is_transport() => RefreshError::Transport(e.to_string()),
            AppError::NotionService { status, .. } => RefreshError::Status(status.as_u16()),
            other => RefreshError::Malformed(other.to_string()),
        }
    }
}

/// Retrieves the current asset of an owner from the origin.
///
/// `Ok(None)` means the owner exists but carries no usable asset, or is no
/// longer there.
#[async_trait::async_trait]
pub trait RefreshClient: Send + Sync {
    async fn fetch_owner(&self, owner: &AssetOwner)
        -> Result<Option<RefreshedAsset>, RefreshError>;
}

/// Refresh client backed by the Notion API: `GET blocks/{id}` for block
/// assets and `GET pages/{id}` for page covers.
///
/// Give it an uncached repository; a cached page response would hand back
/// the same expired signature.
pub struct OriginRefreshClient {
    repo: Arc<dyn NotionRepository>,
}

impl OriginRefreshClient {
    pub fn new(repo: Arc<dyn NotionRepository>) -> Self {
        Self { repo }
    }
}

fn absent_if_not_found(err: AppError) -> Result<Option<RefreshedAsset>, RefreshError> {
    match err.notion_code() {
        Some(code) if code.is_not_found() => Ok(None),
        _ => Err(err.into()),
    }
}

#[async_trait::async_trait]
impl RefreshClient for OriginRefreshClient {
    async fn fetch_owner(
        &self,
        owner: &AssetOwner,
    ) -> Result<Option<RefreshedAsset>, RefreshError> {
        log::debug!("Refreshing asset of {}", owner);
        match owner {
            AssetOwner::Block(id) => match self.repo.retrieve_block(id).await {
                Ok(block) => {
                    let refreshed = RefreshedAsset::from_block(&block);
                    if refreshed.is_none() {
                        log::warn!(
                            "Block {} is a '{}' block without a usable asset",
                            id,
                            block.block_type()
                        );
                    }
                    Ok(refreshed)
                }
                Err(e) => absent_if_not_found(e),
            },
            AssetOwner::PageCover(id) => match self.repo.retrieve_page(id).await {
                Ok(page) => Ok(page.cover.and_then(RefreshedAsset::from_reference)),
                Err(e) => absent_if_not_found(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotionErrorCode;
    use crate::model::{FileSource, Page};
    use crate::types::{BlockId, PageId, TextRun};

    struct OneBlockRepository {
        block: Option<Block>,
    }

    #[async_trait::async_trait]
    impl NotionRepository for OneBlockRepository {
        async fn retrieve_page(&self, _id: &PageId) -> Result<Page, AppError> {
            Err(AppError::MalformedResponse("pages are not served here".to_string()))
        }

        async fn retrieve_block(&self, _id: &BlockId) -> Result<Block, AppError> {
            self.block.clone().ok_or_else(|| AppError::NotionService {
                code: NotionErrorCode::ObjectNotFound,
                message: "gone".to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }

        async fn retrieve_children(&self, _parent: &BlockId) -> Result<Vec<Block>, AppError> {
            Ok(Vec::new())
        }
    }

    fn owner() -> AssetOwner {
        AssetOwner::Block(BlockId::opaque("blk-1").unwrap())
    }

    #[tokio::test]
    async fn test_image_block_yields_new_url() {
        let block = Block::image(
            BlockId::opaque("blk-1").unwrap(),
            FileSource::Hosted {
                url: "https://s3.amazonaws.com/new.png".to_string(),
                expiry_time: None,
            },
        );
        let client = OriginRefreshClient::new(Arc::new(OneBlockRepository { block: Some(block) }));

        let refreshed = client.fetch_owner(&owner()).await.unwrap().unwrap();
        assert_eq!(refreshed.url, "https://s3.amazonaws.com/new.png");
    }

    #[tokio::test]
    async fn test_non_media_block_is_absent() {
        let block = Block::paragraph(BlockId::opaque("blk-1").unwrap(), vec![TextRun::plain("x")]);
        let client = OriginRefreshClient::new(Arc::new(OneBlockRepository { block: Some(block) }));
        assert_eq!(client.fetch_owner(&owner()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_missing_block_is_absent() {
        let client = OriginRefreshClient::new(Arc::new(OneBlockRepository { block: None }));
        assert_eq!(client.fetch_owner(&owner()).await, Ok(None));
    }

    #[test]
    fn test_only_transport_failures_are_retryable() {
        assert!(RefreshError::Transport("reset".to_string()).is_retryable());
        assert!(RefreshError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!RefreshError::Status(500).is_retryable());
        assert!(!RefreshError::Malformed("x".to_string()).is_retryable());
    }
}
