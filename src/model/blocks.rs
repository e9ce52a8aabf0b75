//! Payload types carried by individual block kinds.

use crate::types::{Color, PageId, TextRun};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text body shared by every text-bearing block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextContent {
    pub rich_text: Vec<TextRun>,
    pub color: Color,
}

impl TextContent {
    pub fn new(rich_text: Vec<TextRun>) -> Self {
        Self {
            rich_text,
            color: Color::Default,
        }
    }
}

/// Heading depth. Notion only has three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

/// Where a media payload lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileSource {
    /// A URL the author pasted; never expires.
    External { url: String },
    /// A Notion-hosted upload behind a presigned URL.
    Hosted {
        url: String,
        expiry_time: Option<DateTime<Utc>>,
    },
}

impl FileSource {
    pub fn url(&self) -> &str {
        match self {
            FileSource::External { url } | FileSource::Hosted { url, .. } => url,
        }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self, FileSource::Hosted { .. })
    }
}

/// Image, video, file and PDF blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaContent {
    pub source: FileSource,
    pub caption: Vec<TextRun>,
    /// Display name for file blocks, when the provider supplies one.
    pub name: Option<String>,
}

impl MediaContent {
    pub fn new(source: FileSource) -> Self {
        Self {
            source,
            caption: Vec::new(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { url: String },
    Hosted { url: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeContent {
    pub language: String,
    pub text: TextContent,
    pub caption: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableLayout {
    pub table_width: usize,
    pub has_column_header: bool,
    pub has_row_header: bool,
}

/// Destination of a `link_to_page` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkTarget {
    Page { page_id: PageId },
    Database { database_id: String },
}
