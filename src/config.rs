// src/config.rs
use crate::assets::{AssetOwner, AssetReference, ResolverConfig};
use crate::constants::{
    DISK_CACHE_TTL_SECS, MIRROR_PUBLIC_PREFIX, PLACEHOLDER_URL, REFRESH_TIMEOUT_SECS,
};
use crate::error::AppError;
use crate::types::{ApiKey, BlockId, PageId, ValidationError};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Upper bound accepted for `--refresh-timeout`.
const MAX_REFRESH_TIMEOUT_SECS: u64 = 300;

/// Parsed command-line input, before validation.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// URL shown in place of assets that cannot be displayed
    #[arg(long, global = true, default_value = PLACEHOLDER_URL)]
    pub placeholder: String,

    /// Proxy endpoint for presigned S3 URLs (receives `?url=<encoded>`)
    #[arg(long, global = true)]
    pub image_proxy: Option<String>,

    /// Seconds to wait for each asset refresh call
    #[arg(long, global = true, default_value_t = REFRESH_TIMEOUT_SECS)]
    pub refresh_timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a Notion page as an HTML article
    Render {
        /// Notion page URL or ID
        page: String,

        /// Output file for the HTML (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Disable response caching (always fetch fresh data)
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Cache TTL in seconds
        #[arg(long, default_value_t = DISK_CACHE_TTL_SECS)]
        cache_ttl: u64,

        /// Leave out the table of contents
        #[arg(long, default_value_t = false)]
        no_toc: bool,

        /// Renew expired asset URLs before rendering
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        resolve_assets: bool,

        /// Download hosted images into this directory and link the copies
        #[arg(long)]
        mirror_images: Option<String>,

        /// Site path the mirror directory is served from
        #[arg(long, default_value = MIRROR_PUBLIC_PREFIX)]
        mirror_prefix: String,
    },

    /// Run one asset URL through the resolver and print the outcome
    ResolveAsset {
        /// The asset URL as currently known
        #[arg(long)]
        url: String,

        /// Expiry time (RFC 3339); read from presign parameters when omitted
        #[arg(long)]
        expiry: Option<String>,

        /// Block that owns the asset
        #[arg(long)]
        owner: Option<String>,
    },
}

/// What the binary was asked to do.
#[derive(Debug, Clone)]
pub enum Task {
    Render(RenderOptions),
    ResolveAsset(AssetReference),
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub page_id: PageId,
    pub output_file: Option<PathBuf>,
    pub no_cache: bool,
    pub cache_ttl: u64,
    pub include_toc: bool,
    pub resolve_assets: bool,
    pub mirror: Option<MirrorOptions>,
}

/// Where mirrored images are written and the path they are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOptions {
    pub dir: PathBuf,
    pub public_prefix: String,
}

/// Resolved configuration, validated and ready to drive the pipeline.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub api_key: ApiKey,
    pub task: Task,
    pub verbose: bool,
    pub resolver: ResolverConfig,
}

impl SiteConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let api_key_str = std::env::var("NOTION_API_KEY").map_err(|_| {
            AppError::MissingConfiguration(
                "NOTION_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::from_parts(cli, &api_key_str)
    }

    /// Validates CLI input against an already-read API key.
    pub fn from_parts(cli: CommandLineInput, api_key: &str) -> Result<Self, AppError> {
        let api_key = ApiKey::new(api_key)?;
        let resolver = resolver_config(&cli)?;

        let task = match cli.command {
            Command::Render {
                page,
                output,
                no_cache,
                cache_ttl,
                no_toc,
                resolve_assets,
                mirror_images,
                mirror_prefix,
            } => Task::Render(RenderOptions {
                page_id: PageId::parse(&page)?,
                output_file: output.map(PathBuf::from),
                no_cache,
                cache_ttl,
                include_toc: !no_toc,
                resolve_assets,
                mirror: mirror_options(mirror_images, mirror_prefix)?,
            }),
            Command::ResolveAsset { url, expiry, owner } => {
                Task::ResolveAsset(asset_query(url, expiry, owner)?)
            }
        };

        Ok(SiteConfig {
            api_key,
            task,
            verbose: cli.verbose,
            resolver,
        })
    }
}

fn resolver_config(cli: &CommandLineInput) -> Result<ResolverConfig, ValidationError> {
    if cli.refresh_timeout == 0 || cli.refresh_timeout > MAX_REFRESH_TIMEOUT_SECS {
        return Err(ValidationError::OutOfBounds {
            value: cli.refresh_timeout,
            min: 1,
            max: MAX_REFRESH_TIMEOUT_SECS,
        });
    }
    if cli.placeholder.trim().is_empty() {
        return Err(ValidationError::EmptyField("placeholder"));
    }

    Ok(ResolverConfig {
        placeholder_url: cli.placeholder.clone(),
        refresh_timeout: std::time::Duration::from_secs(cli.refresh_timeout),
        image_proxy: cli.image_proxy.clone().filter(|p| !p.trim().is_empty()),
        ..ResolverConfig::default()
    })
}

fn mirror_options(
    dir: Option<String>,
    prefix: String,
) -> Result<Option<MirrorOptions>, ValidationError> {
    let Some(dir) = dir.filter(|d| !d.trim().is_empty()) else {
        return Ok(None);
    };
    if !prefix.starts_with('/') {
        return Err(ValidationError::InvalidUrl {
            url: prefix,
            reason: "mirror prefix must be a site path starting with '/'".to_string(),
        });
    }
    Ok(Some(MirrorOptions {
        dir: PathBuf::from(dir),
        public_prefix: prefix,
    }))
}

fn asset_query(
    url: String,
    expiry: Option<String>,
    owner: Option<String>,
) -> Result<AssetReference, ValidationError> {
    let mut reference = AssetReference::new(url);
    if let Some(raw) = expiry {
        let parsed = DateTime::parse_from_rfc3339(&raw)
            .map_err(|_| ValidationError::InvalidTimestamp(raw.clone()))?;
        reference = reference.expiring_at(Some(parsed.with_timezone(&Utc)));
    }
    if let Some(owner) = owner {
        reference = reference.owned_by(AssetOwner::Block(BlockId::opaque(owner)?));
    }
    Ok(reference)
}
