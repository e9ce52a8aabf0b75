//! Local copies of Notion-hosted images.
//!
//! A mirror directory holds downloaded files plus `mapping.json`, which maps
//! each hosted URL to the site path of its copy. Hosted URLs carry a new
//! signature after every refresh, so entries are keyed by the URL without
//! its query string.

use super::resolver::is_object_storage_url;
use super::ResolvedAsset;
use crate::error::AppError;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Name of the URL-to-copy mapping inside the mirror directory.
pub const MAPPING_FILE: &str = "mapping.json";

/// Extension used when the hosted URL does not name one.
const FALLBACK_EXTENSION: &str = "jpg";

pub struct ImageMirror {
    dir: PathBuf,
    public_prefix: String,
    entries: RwLock<IndexMap<String, String>>,
}

impl ImageMirror {
    /// Opens (creating if needed) the mirror at `dir`. Copies are served
    /// from `public_prefix`, e.g. `/notion-images`.
    pub fn open(dir: impl Into<PathBuf>, public_prefix: &str) -> Result<Self, AppError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mapping_path = dir.join(MAPPING_FILE);
        let entries: IndexMap<String, String> = match std::fs::read_to_string(&mapping_path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                AppError::JsonParseError {
                    path: mapping_path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("Opened image mirror {} ({} entries)", dir.display(), entries.len());

        Ok(Self {
            dir,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            entries: RwLock::new(entries),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Site path of the local copy of `url`, if one exists.
    ///
    /// An exact match wins; otherwise any copy of the same object under a
    /// different signature is used.
    pub fn local_url(&self, url: &str) -> Option<String> {
        let entries = self.entries.read();
        entries
            .get(url)
            .or_else(|| entries.get(&object_key(url)))
            .cloned()
    }

    /// Writes `bytes` as the local copy of `url` and records it.
    pub async fn store(&self, url: &str, bytes: &[u8]) -> Result<String, AppError> {
        let key = object_key(url);
        let file_name = mirror_file_name(&key);
        let staging = self
            .dir
            .join(format!(".{}.{}", file_name, uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, self.dir.join(&file_name)).await?;

        let local = format!("{}/{}", self.public_prefix, file_name);
        self.record(key, &local);
        Ok(local)
    }

    /// Downloads `url` into the mirror.
    pub async fn download(&self, client: &reqwest::Client, url: &str) -> Result<String, AppError> {
        let response = client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::debug!("Downloaded {} bytes for {}", bytes.len(), object_key(url));
        self.store(url, &bytes).await
    }

    /// Copies a resolved hosted asset into the mirror.
    ///
    /// `original_url` is the URL the page was rendered with; it is recorded
    /// alongside the URL actually downloaded, which differs after a refresh.
    /// Returns `None` for assets that are not hosted, already mirrored, or
    /// showing the placeholder.
    pub async fn mirror(
        &self,
        client: &reqwest::Client,
        original_url: &str,
        asset: &ResolvedAsset,
    ) -> Result<Option<String>, AppError> {
        let source = &asset.reference.url;
        if asset.state.shows_placeholder()
            || !(is_object_storage_url(original_url) || is_object_storage_url(source))
            || self.local_url(original_url).is_some()
        {
            return Ok(None);
        }

        let local = self.download(client, source).await?;
        self.record(object_key(original_url), &local);
        Ok(Some(local))
    }

    /// Persists the mapping next to the copies.
    pub fn save(&self) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&*self.entries.read())?;
        let path = self.dir.join(MAPPING_FILE);
        let staging = self.dir.join(format!(".{}.{}", MAPPING_FILE, uuid::Uuid::new_v4().simple()));
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }

    fn record(&self, key: String, local: &str) {
        self.entries.write().insert(key, local.to_string());
    }
}

/// `url` without its query string and fragment.
fn object_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// File name of the copy of `key`: a hash of the object URL plus the
/// extension it names.
fn mirror_file_name(key: &str) -> String {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);

    let extension = url::Url::parse(key)
        .ok()
        .and_then(|parsed| {
            let last = parsed.path_segments()?.next_back()?.to_string();
            let (_, ext) = last.rsplit_once('.')?;
            let valid = (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    format!("{:016x}.{}", hasher.finish(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetReference, AssetState};

    const SIGNED: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/img-1/Shirt.PNG?X-Amz-Signature=aaa";
    const RESIGNED: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/img-1/Shirt.PNG?X-Amz-Signature=bbb";

    fn temp_mirror_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("notionpress-mirror-{}-{}", name, uuid::Uuid::new_v4()))
    }

    fn resolved(url: &str, state: AssetState) -> ResolvedAsset {
        ResolvedAsset {
            display_url: url.to_string(),
            state,
            is_refreshing: false,
            reference: AssetReference::new(url),
        }
    }

    #[tokio::test]
    async fn test_copy_is_found_under_a_new_signature() {
        let dir = temp_mirror_dir("lookup");
        let mirror = ImageMirror::open(&dir, "/notion-images/").unwrap();

        let local = mirror.store(SIGNED, b"png-bytes").await.unwrap();

        assert!(local.starts_with("/notion-images/"));
        assert!(local.ends_with(".png"));
        assert_eq!(mirror.local_url(RESIGNED), Some(local.clone()));
        assert_eq!(mirror.local_url("https://cdn.example/other.png"), None);

        let file_name = local.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(dir.join(file_name)).unwrap(), b"png-bytes");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_mapping_survives_reopen() {
        let dir = temp_mirror_dir("reopen");
        let mirror = ImageMirror::open(&dir, "/notion-images").unwrap();
        let local = mirror.store(SIGNED, b"x").await.unwrap();
        mirror.save().unwrap();

        let reopened = ImageMirror::open(&dir, "/notion-images").unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.local_url(RESIGNED), Some(local));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_mapping_is_reported() {
        let dir = temp_mirror_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MAPPING_FILE), "not json").unwrap();

        let err = ImageMirror::open(&dir, "/notion-images").err().unwrap();
        assert!(matches!(err, AppError::JsonParseError { .. }));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_only_displayable_hosted_assets_are_downloaded() {
        let dir = temp_mirror_dir("skip");
        let mirror = ImageMirror::open(&dir, "/notion-images").unwrap();
        let client = reqwest::Client::new();

        let external = resolved("https://cdn.example/a.png", AssetState::Fresh);
        assert_eq!(
            mirror.mirror(&client, "https://cdn.example/a.png", &external).await.unwrap(),
            None
        );

        let failed = resolved(SIGNED, AssetState::RefreshFailed);
        assert_eq!(mirror.mirror(&client, SIGNED, &failed).await.unwrap(), None);

        mirror.store(SIGNED, b"x").await.unwrap();
        let fresh = resolved(RESIGNED, AssetState::Fresh);
        assert_eq!(mirror.mirror(&client, RESIGNED, &fresh).await.unwrap(), None);
        assert_eq!(mirror.len(), 1);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_names_fall_back_to_jpg() {
        let name = mirror_file_name("https://s3.us-west-2.amazonaws.com/ws/img-1/download");
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 16 + ".jpg".len());
    }
}
