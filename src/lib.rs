// src/lib.rs
//! notionpress library: renders Notion pages as static HTML articles and
//! keeps their expiring asset URLs displayable.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `SiteConfig`, `CommandLineInput`
//! - **Domain model**: `Page`, `Block`, `BlockKind`
//! - **Domain types**: `PageId`, `BlockId`, `ApiKey`, `TextRun`
//! - **API client**: `NotionHttpClient`, `CachedNotionClient`, `fetch_page_tree`
//! - **Formatting**: `normalize`, `render_article`, `table_of_contents`
//! - **Assets**: `AssetResolver`, `AssetReference`, `RefreshCache`, `AssetSlot`,
//!   `ImageMirror`

pub mod analytics;
pub mod api;
pub mod assets;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod formatting;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, MirrorOptions, RenderOptions, SiteConfig, Task};

// --- Domain Model ---
pub use crate::model::{Block, BlockKind, FileSource, ListKind, Page, PageTitle};

// --- Domain Types ---
pub use crate::types::{
    AbsoluteUrl, Annotations, ApiKey, BlockId, Color, PageId, RenderedPage, TextRun,
};

// --- API Client ---
pub use crate::api::{
    fetch_block_tree, fetch_page_tree, CachedNotionClient, NotionHttpClient, NotionRepository,
};

// --- Formatting ---
pub use crate::formatting::{
    normalize, render_article, render_nodes, table_of_contents, HtmlContext, ListGroup,
    RenderNode,
};

// --- Assets ---
pub use crate::assets::{
    AssetOwner, AssetReference, AssetResolver, AssetSlot, AssetState, ImageMirror, OriginRefreshClient,
    RefreshCache, RefreshClient, ResolvedAsset, ResolverConfig,
};

// --- Pipeline Traits ---
pub use crate::pipeline::{ArticleComposer, ContentSource, PageComposer, PageDelivery};
