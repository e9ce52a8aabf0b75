// src/pipeline.rs
//! Pipeline capability traits: the three stages of turning a Notion page
//! into a published article.
//!
//! Each trait describes a single capability, so each stage can be tested in
//! isolation.

use crate::assets::{AssetReference, AssetResolver, ImageMirror, ResolvedAsset};
use crate::constants::MIRROR_DOWNLOAD_CONCURRENCY;
use crate::error::AppError;
use crate::formatting::{
    collect_assets, normalize, render_article, table_of_contents, HtmlContext,
};
use crate::model::Page;
use crate::output::OutputReport;
use crate::types::{PageId, RenderedPage};
use futures::{stream, StreamExt};
use indexmap::IndexMap;
use std::sync::Arc;

/// Retrieves a page and its block tree.
#[async_trait::async_trait]
pub trait ContentSource {
    async fn fetch(&self, id: &PageId) -> Result<Page, AppError>;
}

/// Normalizes a page, resolves its assets and renders it.
///
/// Asset resolution never fails, so the only errors are formatting ones.
#[async_trait::async_trait]
pub trait PageComposer {
    async fn compose(&self, page: &Page) -> Result<RenderedPage, AppError>;
}

/// Delivers a rendered page to its destinations.
pub trait PageDelivery {
    fn deliver(&self, page: RenderedPage) -> Result<OutputReport, AppError>;
}

/// Renders pages as HTML articles, renewing expired assets on the way.
pub struct ArticleComposer {
    resolver: Arc<AssetResolver>,
    include_toc: bool,
    resolve_assets: bool,
    mirror: Option<(Arc<ImageMirror>, reqwest::Client)>,
}

impl ArticleComposer {
    pub fn new(resolver: Arc<AssetResolver>) -> Self {
        Self {
            resolver,
            include_toc: true,
            resolve_assets: true,
            mirror: None,
        }
    }

    pub fn with_toc(mut self, include_toc: bool) -> Self {
        self.include_toc = include_toc;
        self
    }

    /// When off, assets are shown in their initial state and the origin is
    /// never contacted.
    pub fn with_asset_resolution(mut self, resolve_assets: bool) -> Self {
        self.resolve_assets = resolve_assets;
        self
    }

    /// Download hosted images into `mirror` and display the local copies.
    pub fn with_mirror(mut self, mirror: Arc<ImageMirror>, client: reqwest::Client) -> Self {
        self.mirror = Some((mirror, client));
        self
    }

    /// Copies hosted assets into the mirror and points them at the copies.
    ///
    /// A failed download keeps the hosted URL; the mapping is saved once
    /// all downloads finish.
    pub async fn mirror_assets(&self, assets: &mut IndexMap<String, ResolvedAsset>) {
        let Some((mirror, client)) = &self.mirror else {
            return;
        };

        let downloads: Vec<_> = assets
            .iter()
            .map(|(original, asset)| async move {
                match mirror.mirror(client, original, asset).await {
                    Ok(local) => local.map(|local| (original.clone(), local)),
                    Err(e) => {
                        log::warn!("Could not mirror {}: {}", asset.reference.cache_key(), e);
                        None
                    }
                }
            })
            .collect();
        let copies: Vec<(String, String)> = stream::iter(downloads)
            .buffer_unordered(MIRROR_DOWNLOAD_CONCURRENCY)
            .filter_map(|copy| async move { copy })
            .collect()
            .await;

        if copies.is_empty() {
            return;
        }
        log::info!("Mirrored {} image(s) into {}", copies.len(), mirror.dir().display());
        for (original, local) in copies {
            if let Some(asset) = assets.get_mut(&original) {
                asset.display_url = local;
            }
        }
        if let Err(e) = mirror.save() {
            log::warn!("Could not save image mirror mapping: {}", e);
        }
    }

    /// Display state of every asset on `page`, keyed by original URL.
    pub async fn resolve_assets(
        &self,
        page: &Page,
        references: Vec<AssetReference>,
    ) -> IndexMap<String, ResolvedAsset> {
        let mut references = references;
        if let Some(cover) = &page.cover {
            references.insert(0, cover.clone());
        }

        let resolved = if self.resolve_assets {
            self.resolver.resolve_all(&references).await
        } else {
            references.iter().map(|r| self.resolver.initial(r)).collect()
        };

        references
            .into_iter()
            .map(|r| r.url)
            .zip(resolved)
            .collect()
    }
}

#[async_trait::async_trait]
impl PageComposer for ArticleComposer {
    async fn compose(&self, page: &Page) -> Result<RenderedPage, AppError> {
        let nodes = normalize(&page.blocks, 0);
        let references: Vec<AssetReference> = collect_assets(&nodes).into_values().collect();
        let mut assets = self.resolve_assets(page, references).await;
        self.mirror_assets(&mut assets).await;

        let failed = assets
            .values()
            .filter(|asset| asset.state.shows_placeholder())
            .count();
        if failed > 0 {
            log::warn!("{} of {} assets fell back to the placeholder", failed, assets.len());
        }

        let toc = table_of_contents(&nodes);
        let ctx = HtmlContext {
            assets: Some(&assets),
            placeholder_url: &self.resolver.config().placeholder_url,
            toc: self.include_toc.then_some(toc.as_slice()),
        };
        render_article(page, &nodes, &ctx)
    }
}
