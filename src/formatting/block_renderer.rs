// src/formatting/block_renderer.rs
//! Per-block rendering: turns one provider block into a render-ready shape.
//!
//! A shape carries resolved rich text and asset references but no children;
//! how children nest is the normalizer's business.

use super::rich_text::{resolve_rich_text, StyledText};
use crate::assets::{AssetOwner, AssetReference};
use crate::model::{Block, BlockKind, HeadingLevel, Icon, LinkTarget, TableLayout};
use crate::types::{BlockId, Color};
use serde_json::Value;

/// Which media element an asset is shown with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    File,
    Pdf,
}

/// Render-ready content of a single block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockShape {
    Paragraph {
        text: StyledText,
        color: Color,
    },
    Heading {
        level: HeadingLevel,
        text: StyledText,
        anchor: String,
        is_toggleable: bool,
    },
    ToDo {
        text: StyledText,
        checked: bool,
    },
    Quote {
        text: StyledText,
    },
    Callout {
        text: StyledText,
        icon: Option<Icon>,
        color: Color,
    },
    Code {
        language: String,
        source: String,
        caption: StyledText,
    },
    Equation {
        expression: String,
    },
    Divider,
    Media {
        kind: MediaKind,
        asset: AssetReference,
        caption: StyledText,
        name: Option<String>,
    },
    Bookmark {
        url: String,
        caption: StyledText,
    },
    Embed {
        url: String,
    },
    ChildPage {
        title: String,
    },
    ChildDatabase {
        title: String,
    },
    LinkToPage(LinkTarget),
    Table {
        layout: TableLayout,
        rows: Vec<Vec<StyledText>>,
    },
    /// A row found outside of a table.
    TableRow {
        cells: Vec<StyledText>,
    },
    SyncedBlock {
        synced_from: Option<BlockId>,
    },
    Unsupported {
        block_type: String,
        raw: Value,
    },
    /// Text of a list item or toggle summary.
    Inline {
        text: StyledText,
    },
}

/// Anchor id of a heading, linked to from the table of contents.
pub fn heading_anchor(id: &BlockId) -> String {
    format!("heading-{}", id.as_str())
}

/// Builds the shape of `block`. Tables take their rows from the block's
/// `table_row` children; everything else ignores children.
pub fn shape_block(block: &Block) -> BlockShape {
    match block.kind() {
        BlockKind::Paragraph(content) => BlockShape::Paragraph {
            text: resolve_rich_text(&content.rich_text),
            color: content.color,
        },
        BlockKind::Heading {
            level,
            content,
            is_toggleable,
        } => BlockShape::Heading {
            level: *level,
            text: resolve_rich_text(&content.rich_text),
            anchor: heading_anchor(block.id()),
            is_toggleable: *is_toggleable,
        },
        BlockKind::BulletedListItem(content)
        | BlockKind::NumberedListItem(content)
        | BlockKind::Toggle(content) => BlockShape::Inline {
            text: resolve_rich_text(&content.rich_text),
        },
        BlockKind::ToDo { content, checked } => BlockShape::ToDo {
            text: resolve_rich_text(&content.rich_text),
            checked: *checked,
        },
        BlockKind::Quote(content) => BlockShape::Quote {
            text: resolve_rich_text(&content.rich_text),
        },
        BlockKind::Callout { content, icon } => BlockShape::Callout {
            text: resolve_rich_text(&content.rich_text),
            icon: icon.clone(),
            color: content.color,
        },
        BlockKind::Code(code) => BlockShape::Code {
            language: code.language.clone(),
            source: resolve_rich_text(&code.text.rich_text).plain_text(),
            caption: resolve_rich_text(&code.caption),
        },
        BlockKind::Equation { expression } => BlockShape::Equation {
            expression: expression.clone(),
        },
        BlockKind::Divider => BlockShape::Divider,
        BlockKind::Image(media)
        | BlockKind::Video(media)
        | BlockKind::File(media)
        | BlockKind::Pdf(media) => BlockShape::Media {
            kind: media_kind(block.kind()),
            asset: AssetReference::from_source(
                &media.source,
                AssetOwner::Block(block.id().clone()),
            ),
            caption: resolve_rich_text(&media.caption),
            name: media.name.clone(),
        },
        BlockKind::Bookmark { url, caption } => BlockShape::Bookmark {
            url: url.clone(),
            caption: resolve_rich_text(caption),
        },
        BlockKind::Embed { url } => BlockShape::Embed { url: url.clone() },
        BlockKind::ChildPage { title } => BlockShape::ChildPage {
            title: title.clone(),
        },
        BlockKind::ChildDatabase { title } => BlockShape::ChildDatabase {
            title: title.clone(),
        },
        BlockKind::LinkToPage(target) => BlockShape::LinkToPage(target.clone()),
        BlockKind::Table(layout) => BlockShape::Table {
            layout: layout.clone(),
            rows: table_rows(block.children()),
        },
        BlockKind::TableRow { cells } => BlockShape::TableRow {
            cells: cells.iter().map(|cell| resolve_rich_text(cell)).collect(),
        },
        BlockKind::SyncedBlock { synced_from } => BlockShape::SyncedBlock {
            synced_from: synced_from.clone(),
        },
        BlockKind::Unsupported { block_type, raw } => BlockShape::Unsupported {
            block_type: block_type.clone(),
            raw: raw.clone(),
        },
    }
}

fn media_kind(kind: &BlockKind) -> MediaKind {
    match kind {
        BlockKind::Video(_) => MediaKind::Video,
        BlockKind::File(_) => MediaKind::File,
        BlockKind::Pdf(_) => MediaKind::Pdf,
        _ => MediaKind::Image,
    }
}

/// Rows of a table. Other children are normalized as the table's trailing
/// children instead.
fn table_rows(children: &[Block]) -> Vec<Vec<StyledText>> {
    children
        .iter()
        .filter_map(|child| match child.kind() {
            BlockKind::TableRow { cells } => {
                Some(cells.iter().map(|cell| resolve_rich_text(cell)).collect())
            }
            _ => None,
        })
        .collect()
}
