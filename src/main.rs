// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notionpress::analytics::measure_content;
use notionpress::api::{self, NotionRepository};
use notionpress::output::{deliver, DeliveryTarget, OutputPlan, OutputReport};
use notionpress::{
    AppError, ArticleComposer, AssetReference, AssetResolver, CommandLineInput, ContentSource,
    ImageMirror, OriginRefreshClient, Page, PageComposer, PageDelivery, PageId, RefreshCache,
    RenderOptions, RenderedPage, SiteConfig, Task,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notionpress.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Log to stderr so rendered HTML on stdout stays clean.
    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Builds the resolver that renews expired asset URLs.
///
/// Refreshes always go to the live API; a cached block would carry the
/// same expired URL.
fn build_resolver(
    config: &SiteConfig,
    mirror: Option<Arc<ImageMirror>>,
) -> Result<Arc<AssetResolver>, AppError> {
    let origin: Arc<dyn NotionRepository> = Arc::new(api::NotionHttpClient::new(&config.api_key)?);
    let resolver = AssetResolver::new(
        Arc::new(OriginRefreshClient::new(origin)),
        Arc::new(RefreshCache::new()),
        config.resolver.clone(),
    );
    Ok(Arc::new(match mirror {
        Some(mirror) => resolver.with_mirror(mirror),
        None => resolver,
    }))
}

/// Executes the three-stage pipeline: fetch → compose → deliver.
async fn execute_render(config: &SiteConfig, options: &RenderOptions) -> Result<(), AppError> {
    let pipeline = NotionPress::new(config, options)?;

    let page = pipeline.fetch(&options.page_id).await?;
    let rendered = pipeline.compose(&page).await?;
    let report = pipeline.deliver(rendered)?;
    pipeline.report_completion(&page, &report);

    Ok(())
}

/// Runs a single asset reference through the resolver and prints the outcome.
async fn execute_resolve(config: &SiteConfig, reference: &AssetReference) -> Result<(), AppError> {
    let resolver = build_resolver(config, None)?;
    log::info!(
        "Initial state of {}: {}",
        reference.cache_key(),
        resolver.evaluate(reference)
    );

    let resolved = resolver.resolve(reference).await;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

/// Orchestrates retrieval, rendering and delivery of one page.
struct NotionPress<'a> {
    config: &'a SiteConfig,
    options: &'a RenderOptions,
    composer: ArticleComposer,
}

impl<'a> NotionPress<'a> {
    fn new(config: &'a SiteConfig, options: &'a RenderOptions) -> Result<Self, AppError> {
        let mirror = match &options.mirror {
            Some(mirror) => {
                log::info!("Mirroring hosted images into {}", mirror.dir.display());
                Some(Arc::new(ImageMirror::open(&mirror.dir, &mirror.public_prefix)?))
            }
            None => None,
        };

        let mut composer = ArticleComposer::new(build_resolver(config, mirror.clone())?)
            .with_toc(options.include_toc)
            .with_asset_resolution(options.resolve_assets);
        if let Some(mirror) = mirror {
            let downloads = reqwest::Client::builder()
                .timeout(config.resolver.refresh_timeout)
                .build()?;
            composer = composer.with_mirror(mirror, downloads);
        }
        Ok(Self {
            config,
            options,
            composer,
        })
    }

    /// Reports completion with stats. Silent when the article went to stdout.
    fn report_completion(&self, page: &Page, report: &OutputReport) {
        let stats = measure_content(&page.blocks);
        log::info!(
            "'{}': {} blocks, depth {}, {} media ({} hosted)",
            page.title(),
            stats.total_blocks,
            stats.deepest_nesting,
            stats.media_blocks,
            stats.hosted_media
        );
        for (block_type, count) in &stats.unsupported {
            log::warn!("{} unsupported '{}' block(s) rendered as notices", count, block_type);
        }

        for completed in &report.completed {
            if let DeliveryTarget::WriteFile { path, .. } = &completed.operation {
                println!(
                    "✓ '{}' saved to {} ({} blocks)",
                    page.title(),
                    path.display(),
                    stats.total_blocks
                );
            }
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for NotionPress<'_> {
    async fn fetch(&self, id: &PageId) -> Result<Page, AppError> {
        log::info!("Retrieving page {}", id);

        let http_client = api::NotionHttpClient::new(&self.config.api_key)?;
        let client: Arc<dyn NotionRepository> = if self.options.no_cache {
            log::info!("Cache disabled, all requests go to the Notion API");
            Arc::new(http_client)
        } else {
            log::info!("Cache enabled (TTL: {}s)", self.options.cache_ttl);
            Arc::new(api::CachedNotionClient::new(http_client, self.options.cache_ttl).await?)
        };

        api::fetch_page_tree(client.as_ref(), id).await
    }
}

#[async_trait::async_trait]
impl PageComposer for NotionPress<'_> {
    async fn compose(&self, page: &Page) -> Result<RenderedPage, AppError> {
        self.composer.compose(page).await
    }
}

impl PageDelivery for NotionPress<'_> {
    fn deliver(&self, page: RenderedPage) -> Result<OutputReport, AppError> {
        let content = page.into_string();
        let target = match &self.options.output_file {
            Some(path) => DeliveryTarget::WriteFile {
                path: path.clone(),
                content,
            },
            None => DeliveryTarget::PrintToStdout { content },
        };

        let report = deliver(OutputPlan::new().with_operation(target))?;
        if !report.is_success() {
            return Err(AppError::DeliveryFailed {
                failures: report.failed.iter().map(|f| f.error.clone()).collect(),
            });
        }
        Ok(report)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).context("failed to initialize logging")?;

    let config = SiteConfig::resolve(cli)?;

    match &config.task {
        Task::Render(options) => execute_render(&config, options)
            .await
            .with_context(|| format!("failed to render page {}", options.page_id))?,
        Task::ResolveAsset(reference) => execute_resolve(&config, reference).await?,
    }

    Ok(())
}
