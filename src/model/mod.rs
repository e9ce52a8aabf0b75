mod block;
pub mod blocks;
pub mod common;

pub use block::{Block, BlockKind, ListKind};
pub use blocks::*;
pub use common::*;

use crate::assets::AssetReference;
use crate::types::PageId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A blog post as stored in Notion: page metadata plus its block tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: PageTitle,
    pub url: String,
    /// Value of the `Slug` property, when set.
    pub slug: Option<String>,
    /// Value of the `Excerpt` property, when set.
    pub excerpt: Option<String>,
    /// Start of the `Date` property.
    pub published: Option<NaiveDate>,
    /// Names from the `Tags` multi-select.
    pub tags: Vec<String>,
    /// The page cover, owned by the page itself for refresh purposes.
    pub cover: Option<AssetReference>,
    pub blocks: Vec<Block>,
}

impl Page {
    /// Get the page title
    pub fn title(&self) -> &PageTitle {
        &self.title
    }
}

/// Page title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTitle(String);

impl PageTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PageTitle {
    fn default() -> Self {
        Self("Untitled".to_string())
    }
}

impl std::fmt::Display for PageTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
