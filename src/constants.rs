// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many children the Notion API returns per page of results.
///
/// The Notion API maximum is 100.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Maximum nesting depth when attaching children to a block tree.
///
/// Blocks can nest arbitrarily deep. This limit stops runaway fetches on
/// pathological content.
pub const NOTION_MAX_FETCH_DEPTH: u8 = 50;

/// Notion API version header sent with every request.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// Base URL of the Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1/";

// ---------------------------------------------------------------------------
// Expiring assets
// ---------------------------------------------------------------------------

/// A presigned URL within this many seconds of its expiry is already stale.
///
/// Covers the time between rendering the URL and the browser requesting it.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 5 * 60;

/// Upper bound on a single origin refresh call.
pub const REFRESH_TIMEOUT_SECS: u64 = 30;

/// Retries after the first refresh attempt, for transient failures only.
pub const MAX_REFRESH_RETRIES: u32 = 1;

/// Pause before the refresh retry.
pub const REFRESH_RETRY_DELAY_MS: u64 = 250;

/// How long a refreshed URL is reused before asking the origin again.
///
/// Presigned Notion URLs live for an hour; 50 minutes leaves room for the
/// safety margin.
pub const REFRESH_CACHE_TTL_SECS: i64 = 50 * 60;

/// How long a failed refresh is remembered, so a burst of requests for the
/// same owner does not hammer the origin.
pub const REFRESH_DEDUP_WINDOW_SECS: i64 = 60;

/// Shown wherever an asset cannot be displayed.
pub const PLACEHOLDER_URL: &str = "/images/placeholder.svg";

/// Host suffix of presigned object-storage URLs that need proxying.
pub const PRESIGNED_HOST_SUFFIX: &str = "amazonaws.com";

/// Site path that mirrored image copies are served from.
pub const MIRROR_PUBLIC_PREFIX: &str = "/notion-images";

/// Simultaneous downloads when mirroring a page's images.
pub const MIRROR_DOWNLOAD_CONCURRENCY: usize = 4;

// ---------------------------------------------------------------------------
// Disk cache
// ---------------------------------------------------------------------------

/// Default lifetime of cached page and children responses.
pub const DISK_CACHE_TTL_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// String capacity hints (performance, not correctness)
// ---------------------------------------------------------------------------

/// Estimated characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 256;

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
