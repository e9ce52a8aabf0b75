use super::blocks::*;
use super::common::BlockCommon;
use crate::types::{BlockId, TextRun};
use serde::{Deserialize, Serialize};

/// The closed set of block kinds this site knows how to render.
///
/// Anything else the provider sends is kept as `Unsupported` with its raw tag
/// and payload so the surface can show a visible notice instead of silently
/// dropping content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph(TextContent),
    Heading {
        level: HeadingLevel,
        content: TextContent,
        is_toggleable: bool,
    },
    BulletedListItem(TextContent),
    NumberedListItem(TextContent),
    ToDo {
        content: TextContent,
        checked: bool,
    },
    Toggle(TextContent),
    Quote(TextContent),
    Callout {
        content: TextContent,
        icon: Option<Icon>,
    },
    Code(CodeContent),
    Equation {
        expression: String,
    },
    Divider,
    Image(MediaContent),
    Video(MediaContent),
    File(MediaContent),
    Pdf(MediaContent),
    Bookmark {
        url: String,
        caption: Vec<TextRun>,
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
    Table(TableLayout),
    TableRow {
        cells: Vec<Vec<TextRun>>,
    },
    SyncedBlock {
        synced_from: Option<BlockId>,
    },
    Unsupported {
        block_type: String,
        raw: serde_json::Value,
    },
}

/// Which list a list item belongs to. Items of different kinds never share
/// a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

/// One node of the provider's document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub common: BlockCommon,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            common: BlockCommon::new(id),
            kind,
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.common = self.common.with_children(children);
        self
    }

    /// Get the block's ID
    pub fn id(&self) -> &BlockId {
        &self.common.id
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn children(&self) -> &[Block] {
        &self.common.children
    }

    /// Check if the provider reported children for this block
    pub fn has_children(&self) -> bool {
        self.common.has_children
    }

    /// Set children
    pub fn set_children(&mut self, children: Vec<Block>) {
        self.common.children = children;
    }

    /// The block's own inline text. Empty for kinds without a text body.
    pub fn rich_text(&self) -> &[TextRun] {
        match &self.kind {
            BlockKind::Paragraph(c)
            | BlockKind::BulletedListItem(c)
            | BlockKind::NumberedListItem(c)
            | BlockKind::Toggle(c)
            | BlockKind::Quote(c) => &c.rich_text,
            BlockKind::Heading { content, .. }
            | BlockKind::ToDo { content, .. }
            | BlockKind::Callout { content, .. } => &content.rich_text,
            BlockKind::Code(code) => &code.text.rich_text,
            _ => &[],
        }
    }

    /// The list this item belongs to, if it is a list item.
    pub fn list_kind(&self) -> Option<ListKind> {
        match self.kind {
            BlockKind::BulletedListItem(_) => Some(ListKind::Bulleted),
            BlockKind::NumberedListItem(_) => Some(ListKind::Numbered),
            _ => None,
        }
    }

    /// The media payload of image, video, file and PDF blocks.
    pub fn media(&self) -> Option<&MediaContent> {
        match &self.kind {
            BlockKind::Image(m) | BlockKind::Video(m) | BlockKind::File(m) | BlockKind::Pdf(m) => {
                Some(m)
            }
            _ => None,
        }
    }

    /// Get block type name as the provider spells it
    pub fn block_type(&self) -> &str {
        match &self.kind {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading { level, .. } => match level {
                HeadingLevel::H1 => "heading_1",
                HeadingLevel::H2 => "heading_2",
                HeadingLevel::H3 => "heading_3",
            },
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::ToDo { .. } => "to_do",
            BlockKind::Toggle(_) => "toggle",
            BlockKind::Quote(_) => "quote",
            BlockKind::Callout { .. } => "callout",
            BlockKind::Code(_) => "code",
            BlockKind::Equation { .. } => "equation",
            BlockKind::Divider => "divider",
            BlockKind::Image(_) => "image",
            BlockKind::Video(_) => "video",
            BlockKind::File(_) => "file",
            BlockKind::Pdf(_) => "pdf",
            BlockKind::Bookmark { .. } => "bookmark",
            BlockKind::Embed { .. } => "embed",
            BlockKind::ChildPage { .. } => "child_page",
            BlockKind::ChildDatabase { .. } => "child_database",
            BlockKind::LinkToPage(_) => "link_to_page",
            BlockKind::Table(_) => "table",
            BlockKind::TableRow { .. } => "table_row",
            BlockKind::SyncedBlock { .. } => "synced_block",
            BlockKind::Unsupported { block_type, .. } => block_type,
        }
    }
}

/// Convenience constructors, mostly for fixtures and tests.
impl Block {
    pub fn paragraph(id: BlockId, rich_text: Vec<TextRun>) -> Self {
        Self::new(id, BlockKind::Paragraph(TextContent::new(rich_text)))
    }

    pub fn bulleted(id: BlockId, rich_text: Vec<TextRun>) -> Self {
        Self::new(id, BlockKind::BulletedListItem(TextContent::new(rich_text)))
    }

    pub fn numbered(id: BlockId, rich_text: Vec<TextRun>) -> Self {
        Self::new(id, BlockKind::NumberedListItem(TextContent::new(rich_text)))
    }

    pub fn toggle(id: BlockId, rich_text: Vec<TextRun>) -> Self {
        Self::new(id, BlockKind::Toggle(TextContent::new(rich_text)))
    }

    pub fn heading(id: BlockId, level: HeadingLevel, rich_text: Vec<TextRun>) -> Self {
        Self::new(
            id,
            BlockKind::Heading {
                level,
                content: TextContent::new(rich_text),
                is_toggleable: false,
            },
        )
    }

    pub fn image(id: BlockId, source: FileSource) -> Self {
        Self::new(id, BlockKind::Image(MediaContent::new(source)))
    }
}
