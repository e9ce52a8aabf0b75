// src/formatting/mod.rs
//! Turns Notion block trees into render trees and HTML.

// Sub-modules
pub mod block_renderer;
pub mod html;
pub mod normalize;
pub mod rich_text;
pub mod toc;

pub use block_renderer::{shape_block, BlockShape, MediaKind};
pub use html::{render_article, render_nodes, AssetLookup, HtmlContext};
pub use normalize::{
    collect_assets, flatten_ids, normalize, ListGroup, ListItem, RenderNode, RenderedBlock,
    ToggleNode,
};
pub use toc::{table_of_contents, TocEntry};
