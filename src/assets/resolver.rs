//! Decides what URL to display for an asset, renewing expired ones.
//!
//! The resolver never fails: every path ends in a display URL, with the
//! placeholder standing in whenever nothing better is available.

use super::cache::{CacheLookup, RefreshCache, RefreshOutcome};
use super::clock::{Clock, SystemClock};
use super::mirror::ImageMirror;
use super::refresh::{RefreshClient, RefreshError};
use super::{expiry, AssetOwner, AssetReference, AssetState, ResolvedAsset};
use crate::constants::{
    EXPIRY_SAFETY_MARGIN_SECS, MAX_REFRESH_RETRIES, PLACEHOLDER_URL, PRESIGNED_HOST_SUFFIX,
    REFRESH_CACHE_TTL_SECS, REFRESH_DEDUP_WINDOW_SECS, REFRESH_RETRY_DELAY_MS,
    REFRESH_TIMEOUT_SECS,
};
use crate::error_recovery::{retry_with_backoff, RetryPolicy};
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

/// Tunables for asset resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Shown whenever an asset cannot be displayed.
    pub placeholder_url: String,
    /// Expiries closer than this to "now" count as already expired.
    pub safety_margin: Duration,
    /// Bound on each origin call.
    pub refresh_timeout: std::time::Duration,
    /// Repeats after a transient refresh failure.
    pub max_retries: u32,
    pub retry_delay: std::time::Duration,
    /// Reuse window for a successful refresh.
    pub success_ttl: Duration,
    /// Reuse window for a failed refresh.
    pub failure_ttl: Duration,
    /// Endpoint that proxies presigned object-storage URLs, if any.
    pub image_proxy: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            placeholder_url: PLACEHOLDER_URL.to_string(),
            safety_margin: Duration::seconds(EXPIRY_SAFETY_MARGIN_SECS),
            refresh_timeout: std::time::Duration::from_secs(REFRESH_TIMEOUT_SECS),
            max_retries: MAX_REFRESH_RETRIES,
            retry_delay: std::time::Duration::from_millis(REFRESH_RETRY_DELAY_MS),
            success_ttl: Duration::seconds(REFRESH_CACHE_TTL_SECS),
            failure_ttl: Duration::seconds(REFRESH_DEDUP_WINDOW_SECS),
            image_proxy: None,
        }
    }
}

pub struct AssetResolver {
    client: Arc<dyn RefreshClient>,
    cache: Arc<RefreshCache>,
    clock: Arc<dyn Clock>,
    mirror: Option<Arc<ImageMirror>>,
    config: ResolverConfig,
}

impl AssetResolver {
    pub fn new(
        client: Arc<dyn RefreshClient>,
        cache: Arc<RefreshCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            client,
            cache,
            clock: Arc::new(SystemClock),
            mirror: None,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Prefer local copies from `mirror` over hosted URLs.
    pub fn with_mirror(mut self, mirror: Arc<ImageMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Initial state of `reference` at the current time.
    pub fn evaluate(&self, reference: &AssetReference) -> AssetState {
        expiry::evaluate(reference, self.clock.now(), self.config.safety_margin)
    }

    /// What to show before any refresh completes. Never touches the network.
    ///
    /// References that cannot be rendered or renewed (empty URL, or expired
    /// without an owner) resolve straight to the placeholder. A mirrored
    /// copy never expires.
    pub fn initial(&self, reference: &AssetReference) -> ResolvedAsset {
        if reference.url.trim().is_empty() {
            log::warn!("Asset reference without a URL; showing placeholder");
            return self.placeholder(reference, AssetState::RefreshFailed);
        }
        if let Some(local) = self.local_copy(&reference.url) {
            return ResolvedAsset {
                display_url: local,
                state: AssetState::Fresh,
                is_refreshing: false,
                reference: reference.clone(),
            };
        }

        match self.evaluate(reference) {
            AssetState::ExpiredPendingRefresh if reference.owner.is_none() => {
                log::warn!(
                    "Expired asset {} has no owner to refresh from; showing placeholder",
                    reference.cache_key()
                );
                self.placeholder(reference, AssetState::RefreshFailed)
            }
            AssetState::ExpiredPendingRefresh => ResolvedAsset {
                display_url: self.display_url(&reference.url),
                state: AssetState::ExpiredPendingRefresh,
                is_refreshing: true,
                reference: reference.clone(),
            },
            state => ResolvedAsset {
                display_url: self.display_url(&reference.url),
                state,
                is_refreshing: false,
                reference: reference.clone(),
            },
        }
    }

    /// Resolves `reference` to a terminal or fresh state.
    ///
    /// Only expired references with an owner reach the origin, through the
    /// shared cache so concurrent requests for one owner make one call.
    pub async fn resolve(&self, reference: &AssetReference) -> ResolvedAsset {
        let initial = self.initial(reference);
        if initial.state != AssetState::ExpiredPendingRefresh {
            return initial;
        }
        let Some(owner) = reference.owner.clone() else {
            return self.placeholder(reference, AssetState::RefreshFailed);
        };

        let key = owner.key();
        let lookup = self
            .cache
            .lookup_or_start(&key, self.clock.now(), || self.refresh_future(owner.clone()));

        let outcome = match lookup {
            CacheLookup::Ready(outcome) => {
                log::debug!("Reusing cached refresh for {}", key);
                outcome
            }
            CacheLookup::Pending(shared) => {
                let outcome = shared.clone().await;
                let valid_until = self.valid_until(&outcome, self.clock.now());
                self.cache.settle(&key, &shared, outcome.clone(), valid_until);
                outcome
            }
        };

        match outcome {
            RefreshOutcome::Refreshed(asset) => {
                log::debug!("Refreshed asset of {}", key);
                let renewed = AssetReference {
                    url: asset.url,
                    expiry_time: asset.expiry_time,
                    owner: Some(owner),
                };
                ResolvedAsset {
                    display_url: self.display_url(&renewed.url),
                    state: AssetState::Refreshed,
                    is_refreshing: false,
                    reference: renewed,
                }
            }
            RefreshOutcome::Failed(reason) => {
                log::warn!("Could not refresh asset of {}: {}", key, reason);
                self.placeholder(reference, AssetState::RefreshFailed)
            }
        }
    }

    /// Resolves several references concurrently, preserving order.
    pub async fn resolve_all(&self, references: &[AssetReference]) -> Vec<ResolvedAsset> {
        futures::future::join_all(references.iter().map(|r| self.resolve(r))).await
    }

    /// The state to enter when the surface reports that an asset failed to
    /// load.
    pub fn load_failed(&self, reference: &AssetReference) -> ResolvedAsset {
        self.placeholder(reference, AssetState::LoadFailed)
    }

    /// The URL the surface should request for `url`.
    ///
    /// A mirrored copy wins. Otherwise, with a proxy configured, presigned
    /// object-storage URLs are routed through it. Site-local paths,
    /// including the placeholder, never are.
    pub fn display_url(&self, url: &str) -> String {
        if let Some(local) = self.local_copy(url) {
            return local;
        }
        match &self.config.image_proxy {
            Some(proxy) if is_object_storage_url(url) => proxied_url(proxy, url),
            _ => url.to_string(),
        }
    }

    fn local_copy(&self, url: &str) -> Option<String> {
        self.mirror.as_ref()?.local_url(url)
    }

    fn placeholder(&self, reference: &AssetReference, state: AssetState) -> ResolvedAsset {
        ResolvedAsset {
            display_url: self.config.placeholder_url.clone(),
            state,
            is_refreshing: false,
            reference: reference.clone(),
        }
    }

    /// How long an outcome may be reused. A renewed URL is never reused
    /// past the point where it would itself count as expired.
    fn valid_until(&self, outcome: &RefreshOutcome, now: DateTime<Utc>) -> DateTime<Utc> {
        match outcome {
            RefreshOutcome::Refreshed(asset) => {
                let ttl_end = now
                    .checked_add_signed(self.config.success_ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                match asset.expiry_time {
                    Some(expiry) => expiry
                        .checked_sub_signed(self.config.safety_margin)
                        .map_or(ttl_end, |usable_until| ttl_end.min(usable_until)),
                    None => ttl_end,
                }
            }
            RefreshOutcome::Failed(_) => now
                .checked_add_signed(self.config.failure_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    fn refresh_future(&self, owner: AssetOwner) -> BoxFuture<'static, RefreshOutcome> {
        let client = Arc::clone(&self.client);
        let timeout = self.config.refresh_timeout;
        let policy = RetryPolicy::with_retries(self.config.max_retries, self.config.retry_delay);

        async move {
            let (client, owner) = (&client, &owner);
            let attempt = move || async move {
                match tokio::time::timeout(timeout, client.fetch_owner(owner)).await {
                    Ok(result) => result,
                    Err(_) => Err(RefreshError::Timeout(timeout)),
                }
            };

            match retry_with_backoff(attempt, policy, RefreshError::is_retryable).await {
                Ok(Some(asset)) => RefreshOutcome::Refreshed(asset),
                Ok(None) => RefreshOutcome::Failed(format!("{} has no usable asset", owner)),
                Err(e) => RefreshOutcome::Failed(e.to_string()),
            }
        }
        .boxed()
    }
}

/// Whether `url` points at presigned object storage.
pub(crate) fn is_object_storage_url(url: &str) -> bool {
    if url.starts_with('/') {
        return false;
    }
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed.host_str().map(|host| {
                host == PRESIGNED_HOST_SUFFIX || host.ends_with(&format!(".{}", PRESIGNED_HOST_SUFFIX))
            })
        })
        .unwrap_or(false)
}

fn proxied_url(proxy: &str, url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    format!("{}?url={}", proxy, encoded)
}
