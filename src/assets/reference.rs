//! Asset references: a URL, when it stops working, and who can renew it.

use crate::model::{Block, FileSource};
use crate::types::{BlockId, PageId};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The Notion object an asset URL belongs to. Asking the origin for this
/// object again yields a freshly signed URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AssetOwner {
    /// An image/file/video/pdf block.
    Block(BlockId),
    /// A page whose cover is the asset.
    PageCover(PageId),
}

impl AssetOwner {
    /// Key used to coalesce and cache refreshes for this owner.
    pub fn key(&self) -> String {
        match self {
            AssetOwner::Block(id) => format!("block:{}", id),
            AssetOwner::PageCover(id) => format!("page:{}", id),
        }
    }
}

impl fmt::Display for AssetOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A renderable asset URL with its optional expiry and owner.
///
/// An expiring reference without an owner cannot be refreshed; the resolver
/// fails it fast to the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub url: String,
    pub expiry_time: Option<DateTime<Utc>>,
    pub owner: Option<AssetOwner>,
}

impl AssetReference {
    /// A reference to `url`, with the expiry read from its presign
    /// parameters when it has them.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let expiry_time = presigned_expiry(&url);
        Self {
            url,
            expiry_time,
            owner: None,
        }
    }

    /// Overrides the expiry, e.g. with the one the provider reported.
    pub fn expiring_at(mut self, expiry_time: Option<DateTime<Utc>>) -> Self {
        self.expiry_time = expiry_time;
        self
    }

    pub fn owned_by(mut self, owner: AssetOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Builds the reference for a media payload found under `owner`.
    ///
    /// External URLs never expire. Hosted files use the provider's
    /// `expiry_time`, falling back to the presign parameters in the URL.
    pub fn from_source(source: &FileSource, owner: AssetOwner) -> Self {
        match source {
            FileSource::External { url } => Self {
                url: url.clone(),
                expiry_time: None,
                owner: Some(owner),
            },
            FileSource::Hosted { url, expiry_time } => Self {
                url: url.clone(),
                expiry_time: expiry_time.or_else(|| presigned_expiry(url)),
                owner: Some(owner),
            },
        }
    }

    /// The asset reference of a media block, if it is one.
    pub fn from_block(block: &Block) -> Option<Self> {
        block
            .media()
            .map(|media| Self::from_source(&media.source, AssetOwner::Block(block.id().clone())))
    }

    pub fn can_expire(&self) -> bool {
        self.expiry_time.is_some()
    }

    /// Key used to coalesce refreshes: the owner when known, else the URL
    /// without its (signature-bearing) query.
    pub fn cache_key(&self) -> String {
        match &self.owner {
            Some(owner) => owner.key(),
            None => format!("url:{}", strip_query(&self.url)),
        }
    }
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Expiry of an AWS presigned URL: `X-Amz-Date` plus `X-Amz-Expires`
/// seconds. `None` when either parameter is missing or malformed.
pub fn presigned_expiry(url: &str) -> Option<DateTime<Utc>> {
    let parsed = Url::parse(url).ok()?;
    let mut signed_at = None;
    let mut lifetime = None;

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "X-Amz-Date" => {
                signed_at = NaiveDateTime::parse_from_str(&value, "%Y%m%dT%H%M%SZ")
                    .ok()
                    .map(|naive| naive.and_utc());
            }
            "X-Amz-Expires" => lifetime = value.parse::<i64>().ok(),
            _ => {}
        }
    }

    signed_at?.checked_add_signed(Duration::try_seconds(lifetime?)?)
}
