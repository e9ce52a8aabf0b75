// src/formatting/toc.rs
//! Table of contents built from the headings of a render tree.

use super::block_renderer::BlockShape;
use super::normalize::{walk, RenderNode, Visit};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Anchor of the heading element.
    pub anchor: String,
    pub level: u8,
    pub text: String,
}

/// Headings with visible text, in document order. Headings nested in
/// toggles and list items are included.
pub fn table_of_contents(nodes: &[RenderNode]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    walk(nodes, &mut |visit| {
        if let Visit::Block(block) = visit {
            if let BlockShape::Heading {
                level, text, anchor, ..
            } = &block.shape
            {
                let text = text.plain_text();
                if !text.trim().is_empty() {
                    entries.push(TocEntry {
                        anchor: anchor.clone(),
                        level: level.as_u8(),
                        text,
                    });
                }
            }
        }
    });
    entries
}
