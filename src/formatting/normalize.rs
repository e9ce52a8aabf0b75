// src/formatting/normalize.rs
//! Document tree normalization.
//!
//! Turns the provider's flat-with-children block list into a render tree:
//! consecutive list items of the same kind are grouped into one list, toggle
//! bodies stay at their parent's level, and every block's inline text is
//! resolved. Normalization is pure and cannot fail.

use super::block_renderer::{shape_block, BlockShape};
use super::rich_text::{resolve_rich_text, StyledText};
use crate::assets::AssetReference;
use crate::model::{Block, BlockKind, ListKind};
use crate::types::BlockId;
use indexmap::IndexMap;

/// One node of the render tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Block(RenderedBlock),
    List(ListGroup),
    Toggle(ToggleNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBlock {
    pub id: BlockId,
    pub shape: BlockShape,
    pub children: Vec<RenderNode>,
}

/// A run of consecutive list items of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ListGroup {
    pub ordered: bool,
    pub items: Vec<ListItem>,
    /// Indentation depth, used for presentation only.
    pub nesting_level: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub id: BlockId,
    pub text: StyledText,
    pub children: Vec<RenderNode>,
}

/// A collapsible block. Its body does not indent further.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleNode {
    pub id: BlockId,
    pub summary: StyledText,
    pub children: Vec<RenderNode>,
    pub level: usize,
}

/// Normalizes `blocks` at indentation depth `level`.
///
/// Output order follows input order and nothing is dropped; only list runs
/// collapse, so the output is never longer than the input. A single list
/// item still forms a group of one.
pub fn normalize(blocks: &[Block], level: usize) -> Vec<RenderNode> {
    let mut nodes = Vec::with_capacity(blocks.len());
    let mut cursor = 0;

    while cursor < blocks.len() {
        let block = &blocks[cursor];

        if let Some(kind) = block.list_kind() {
            let run_len = blocks[cursor..]
                .iter()
                .take_while(|b| b.list_kind() == Some(kind))
                .count();
            let run = &blocks[cursor..cursor + run_len];
            nodes.push(RenderNode::List(group_list(run, kind, level)));
            cursor += run_len;
            continue;
        }

        nodes.push(match block.kind() {
            BlockKind::Toggle(content) => RenderNode::Toggle(ToggleNode {
                id: block.id().clone(),
                summary: resolve_rich_text(&content.rich_text),
                children: normalize(block.children(), level),
                level,
            }),
            _ => RenderNode::Block(render_block(block, level)),
        });
        cursor += 1;
    }

    log::trace!(
        "Normalized {} blocks into {} nodes at level {}",
        blocks.len(),
        nodes.len(),
        level
    );
    nodes
}

fn group_list(run: &[Block], kind: ListKind, level: usize) -> ListGroup {
    ListGroup {
        ordered: kind == ListKind::Numbered,
        items: run
            .iter()
            .map(|item| ListItem {
                id: item.id().clone(),
                text: resolve_rich_text(item.rich_text()),
                children: normalize(item.children(), level + 1),
            })
            .collect(),
        nesting_level: level,
    }
}

fn render_block(block: &Block, level: usize) -> RenderedBlock {
    let children = match block.kind() {
        // Rows are already part of the table shape; anything else follows it.
        BlockKind::Table(_) => {
            let trailing: Vec<Block> = block
                .children()
                .iter()
                .filter(|child| !matches!(child.kind(), BlockKind::TableRow { .. }))
                .cloned()
                .collect();
            if !trailing.is_empty() {
                log::debug!(
                    "Table {} has {} non-row children; rendering them after the table",
                    block.id(),
                    trailing.len()
                );
            }
            normalize(&trailing, level + 1)
        }
        BlockKind::SyncedBlock { .. } => normalize(block.children(), level),
        _ => normalize(block.children(), level + 1),
    };

    if let BlockKind::Unsupported { block_type, .. } = block.kind() {
        log::debug!("Keeping unsupported block {} ({})", block.id(), block_type);
    }

    RenderedBlock {
        id: block.id().clone(),
        shape: shape_block(block),
        children,
    }
}

/// Ids of every block in the tree, depth first in document order.
pub fn flatten_ids(nodes: &[RenderNode]) -> Vec<BlockId> {
    let mut ids = Vec::new();
    walk(nodes, &mut |node| match node {
        Visit::Block(block) => ids.push(block.id.clone()),
        Visit::Item(item) => ids.push(item.id.clone()),
        Visit::Toggle(toggle) => ids.push(toggle.id.clone()),
    });
    ids
}

/// Every asset shown in the tree, keyed by its URL in first-seen order.
pub fn collect_assets(nodes: &[RenderNode]) -> IndexMap<String, AssetReference> {
    let mut assets = IndexMap::new();
    walk(nodes, &mut |node| {
        if let Visit::Block(RenderedBlock {
            shape: BlockShape::Media { asset, .. },
            ..
        }) = node
        {
            assets
                .entry(asset.url.clone())
                .or_insert_with(|| asset.clone());
        }
    });
    assets
}

pub(crate) enum Visit<'a> {
    Block(&'a RenderedBlock),
    Item(&'a ListItem),
    Toggle(&'a ToggleNode),
}

/// Pre-order walk over the render tree.
pub(crate) fn walk<'a>(nodes: &'a [RenderNode], visit: &mut dyn FnMut(Visit<'a>)) {
    for node in nodes {
        match node {
            RenderNode::Block(block) => {
                visit(Visit::Block(block));
                walk(&block.children, visit);
            }
            RenderNode::List(group) => {
                for item in &group.items {
                    visit(Visit::Item(item));
                    walk(&item.children, visit);
                }
            }
            RenderNode::Toggle(toggle) => {
                visit(Visit::Toggle(toggle));
                walk(&toggle.children, visit);
            }
        }
    }
}
