// src/api/cache.rs
//! On-disk cache of page and children responses.
//!
//! Entries live under `pages/<id>.json` and `children/<id>.json` and hold
//! the raw response bodies exactly as Notion sent them. Hits are replayed
//! through the live parsers.

use super::client::{extract_response_text, ApiResponse, NotionHttpClient};
use super::parser;
use super::simple_pagination::children_page_endpoint;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use crate::model::{Block, Page};
use crate::types::{BlockId, PageId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const PAGE_DIR: &str = "pages";
const CHILDREN_DIR: &str = "children";

/// The cached resource: one page, or the full children listing of a block.
#[derive(Debug, Clone, Copy)]
pub enum CacheKey<'a> {
    Page(&'a PageId),
    Children(&'a BlockId),
}

impl CacheKey<'_> {
    fn relative_path(&self) -> PathBuf {
        let (dir, id) = match self {
            CacheKey::Page(id) => (PAGE_DIR, id.as_str()),
            CacheKey::Children(id) => (CHILDREN_DIR, id.as_str()),
        };
        Path::new(dir).join(format!("{}.json", file_stem(id)))
    }
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Page(id) => write!(f, "page {}", id.as_str()),
            CacheKey::Children(id) => write!(f, "children of {}", id.as_str()),
        }
    }
}

/// Provider ids are used as file names when they are plain; anything else
/// is hashed.
fn file_stem(id: &str) -> String {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return id.to_string();
    }
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[derive(serde::Serialize, serde::Deserialize)]
struct CacheEntry {
    cached_at: u64,
    responses: Vec<String>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// TTL-bounded response store. Read and write failures count as misses.
pub struct DiskCache {
    root: PathBuf,
    ttl_secs: u64,
}

impl DiskCache {
    /// Opens the cache in `$XDG_CACHE_HOME/notionpress` (or `~/.cache/notionpress`).
    pub async fn new(ttl_secs: u64) -> Result<Self, std::io::Error> {
        Self::in_dir(Self::default_cache_dir(), ttl_secs).await
    }

    /// Opens the cache rooted at `root`, dropping expired entries.
    pub async fn in_dir(root: PathBuf, ttl_secs: u64) -> Result<Self, std::io::Error> {
        for dir in [PAGE_DIR, CHILDREN_DIR] {
            tokio::fs::create_dir_all(root.join(dir)).await?;
        }
        let cache = Self { root, ttl_secs };
        cache.purge_expired().await;
        Ok(cache)
    }

    fn default_cache_dir() -> PathBuf {
        std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".cache")
            })
            .join("notionpress")
    }

    /// Raw response bodies for `key`, unless missing or expired.
    pub async fn get(&self, key: CacheKey<'_>) -> Option<Vec<String>> {
        let path = self.path_of(key);
        let entry = read_entry(&path).await?;
        if self.is_expired(&entry) {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.responses).filter(|responses| !responses.is_empty())
    }

    pub async fn set(&self, key: CacheKey<'_>, responses: Vec<String>) {
        let entry = CacheEntry {
            cached_at: unix_now(),
            responses,
        };
        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = tokio::fs::write(self.path_of(key), json).await;
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        unix_now().saturating_sub(entry.cached_at) > self.ttl_secs
    }

    fn path_of(&self, key: CacheKey<'_>) -> PathBuf {
        self.root.join(key.relative_path())
    }

    async fn purge_expired(&self) {
        for dir in [PAGE_DIR, CHILDREN_DIR] {
            let Ok(mut entries) = tokio::fs::read_dir(self.root.join(dir)).await else {
                continue;
            };
            while let Ok(Some(file)) = entries.next_entry().await {
                let path = file.path();
                if let Some(entry) = read_entry(&path).await {
                    if self.is_expired(&entry) {
                        let _ = tokio::fs::remove_file(&path).await;
                    }
                }
            }
        }
    }
}

async fn read_entry(path: &Path) -> Option<CacheEntry> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}

fn replayed(key: CacheKey<'_>, data: String) -> ApiResponse<String> {
    ApiResponse {
        data,
        status: reqwest::StatusCode::OK,
        url: format!("cache://{}", key.relative_path().display()),
    }
}

/// A [`NotionRepository`](super::NotionRepository) that caches page and
/// children responses on disk.
///
/// Single-block retrieval always goes to the network: it is how expired
/// asset URLs are renewed, and a cached answer would hand back the same
/// stale signature.
pub struct CachedNotionClient {
    inner: NotionHttpClient,
    cache: DiskCache,
}

impl CachedNotionClient {
    pub async fn new(inner: NotionHttpClient, ttl_secs: u64) -> Result<Self, AppError> {
        let cache = DiskCache::new(ttl_secs)
            .await
            .map_err(|e| AppError::InternalError {
                message: format!("Failed to initialize disk cache: {}", e),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { inner, cache })
    }

    /// Every page of the children listing of `parent`, as raw bodies.
    async fn fetch_children_pages(&self, parent: &BlockId) -> Result<Vec<String>, AppError> {
        let base_endpoint = format!("blocks/{}/children", parent.to_dashed());
        let mut bodies = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let endpoint =
                children_page_endpoint(&base_endpoint, NOTION_API_PAGE_SIZE as u32, cursor.as_deref());
            let response = extract_response_text(self.inner.get(&endpoint).await?).await?;
            let body = response.data.clone();
            let parsed = parser::parse_blocks_pagination(response)?;
            bodies.push(body);

            cursor = parsed.next_cursor.filter(|_| parsed.has_more);
            if cursor.is_none() {
                return Ok(bodies);
            }
        }
    }
}

#[async_trait::async_trait]
impl super::NotionRepository for CachedNotionClient {
    async fn retrieve_page(&self, id: &PageId) -> Result<Page, AppError> {
        let key = CacheKey::Page(id);
        if let Some(mut bodies) = self.cache.get(key).await {
            log::debug!("Cache hit: {}", key);
            return parser::parse_page_response(replayed(key, bodies.swap_remove(0)));
        }

        log::debug!("Cache miss: {}", key);
        let endpoint = format!("pages/{}", id.to_dashed());
        let response = extract_response_text(self.inner.get(&endpoint).await?).await?;
        if response.status.is_success() {
            self.cache.set(key, vec![response.data.clone()]).await;
        }
        parser::parse_page_response(response)
    }

    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError> {
        super::NotionRepository::retrieve_block(&self.inner, id).await
    }

    async fn retrieve_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError> {
        let key = CacheKey::Children(parent);
        let bodies = match self.cache.get(key).await {
            Some(bodies) => {
                log::debug!("Cache hit: {}", key);
                bodies
            }
            None => {
                log::debug!("Cache miss: {}", key);
                let bodies = self.fetch_children_pages(parent).await?;
                self.cache.set(key, bodies.clone()).await;
                bodies
            }
        };

        let mut blocks = Vec::new();
        for body in bodies {
            blocks.extend(parser::parse_blocks_pagination(replayed(key, body))?.results);
        }
        Ok(blocks)
    }
}
