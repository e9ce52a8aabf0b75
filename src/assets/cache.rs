//! Shared, coalescing cache of refresh outcomes.
//!
//! One entry per owner key. While a refresh is running the entry holds the
//! shared future, so every caller for that key awaits the same origin call.
//! Once settled the entry holds the outcome until its validity ends.

use super::RefreshedAsset;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

/// Result of one origin refresh, shared by every caller that waited on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(RefreshedAsset),
    Failed(String),
}

pub type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

enum CacheSlot {
    InFlight(SharedRefresh),
    Settled {
        outcome: RefreshOutcome,
        valid_until: DateTime<Utc>,
    },
}

/// What a lookup found.
pub enum CacheLookup {
    /// A settled outcome that is still valid.
    Ready(RefreshOutcome),
    /// A refresh in flight, possibly just started by this lookup.
    Pending(SharedRefresh),
}

#[derive(Default)]
pub struct RefreshCache {
    entries: DashMap<String, CacheSlot>,
}

impl RefreshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the valid outcome or in-flight refresh for `key`, starting a
    /// new refresh with `start` when there is neither.
    ///
    /// Expired entries anywhere in the cache are dropped first.
    pub fn lookup_or_start<F>(&self, key: &str, now: DateTime<Utc>, start: F) -> CacheLookup
    where
        F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
    {
        self.purge_expired(now);

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let reusable = match occupied.get() {
                    CacheSlot::InFlight(shared) => Some(CacheLookup::Pending(shared.clone())),
                    CacheSlot::Settled {
                        outcome,
                        valid_until,
                    } if *valid_until > now => Some(CacheLookup::Ready(outcome.clone())),
                    CacheSlot::Settled { .. } => None,
                };
                match reusable {
                    Some(lookup) => lookup,
                    None => {
                        let shared = start().shared();
                        occupied.insert(CacheSlot::InFlight(shared.clone()));
                        CacheLookup::Pending(shared)
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let shared = start().shared();
                vacant.insert(CacheSlot::InFlight(shared.clone()));
                CacheLookup::Pending(shared)
            }
        }
    }

    /// Records the outcome of `refresh` under `key`.
    ///
    /// A no-op unless `refresh` is still the entry's in-flight future, so a
    /// late waiter never overwrites a newer refresh or an earlier settlement.
    pub fn settle(
        &self,
        key: &str,
        refresh: &SharedRefresh,
        outcome: RefreshOutcome,
        valid_until: DateTime<Utc>,
    ) {
        if let Some(mut slot) = self.entries.get_mut(key) {
            let is_current = matches!(&*slot, CacheSlot::InFlight(shared) if shared.ptr_eq(refresh));
            if is_current {
                *slot = CacheSlot::Settled {
                    outcome,
                    valid_until,
                };
            }
        }
    }

    /// Drops settled entries whose validity has ended. In-flight entries
    /// are kept.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, slot| match slot {
            CacheSlot::InFlight(_) => true,
            CacheSlot::Settled { valid_until, .. } => *valid_until > now,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn refreshed(url: &str) -> RefreshOutcome {
        RefreshOutcome::Refreshed(RefreshedAsset {
            url: url.to_string(),
            expiry_time: None,
        })
    }

    fn ready(outcome: RefreshOutcome) -> BoxFuture<'static, RefreshOutcome> {
        async move { outcome }.boxed()
    }

    #[tokio::test]
    async fn test_second_lookup_joins_in_flight_refresh() {
        let cache = RefreshCache::new();
        let first = cache.lookup_or_start("block:a", now(), || ready(refreshed("https://x/1")));
        let second = cache.lookup_or_start("block:a", now(), || {
            panic!("a second refresh must not start while one is in flight")
        });

        let (CacheLookup::Pending(a), CacheLookup::Pending(b)) = (first, second) else {
            panic!("both lookups should be pending");
        };
        assert!(a.ptr_eq(&b));
        assert_eq!(a.await, refreshed("https://x/1"));
    }

    #[tokio::test]
    async fn test_settled_outcome_is_served_until_it_expires() {
        let cache = RefreshCache::new();
        let CacheLookup::Pending(shared) =
            cache.lookup_or_start("block:a", now(), || ready(refreshed("https://x/1")))
        else {
            panic!("expected a new refresh");
        };
        let outcome = shared.clone().await;
        cache.settle("block:a", &shared, outcome, now() + Duration::seconds(60));

        match cache.lookup_or_start("block:a", now() + Duration::seconds(30), || {
            panic!("valid outcome should be reused")
        }) {
            CacheLookup::Ready(outcome) => assert_eq!(outcome, refreshed("https://x/1")),
            CacheLookup::Pending(_) => panic!("expected a cached outcome"),
        }

        let later = cache.lookup_or_start("block:a", now() + Duration::seconds(61), || {
            ready(refreshed("https://x/2"))
        });
        match later {
            CacheLookup::Pending(shared) => assert_eq!(shared.await, refreshed("https://x/2")),
            CacheLookup::Ready(_) => panic!("expired outcome must not be served"),
        }
    }

    #[tokio::test]
    async fn test_stale_settle_is_ignored() {
        let cache = RefreshCache::new();
        let CacheLookup::Pending(current) =
            cache.lookup_or_start("block:a", now(), || ready(refreshed("https://x/1")))
        else {
            panic!("expected a new refresh");
        };
        let unrelated = ready(RefreshOutcome::Failed("old".to_string())).shared();

        cache.settle(
            "block:a",
            &unrelated,
            RefreshOutcome::Failed("old".to_string()),
            now() + Duration::hours(1),
        );

        let lookup = cache.lookup_or_start("block:a", now(), || panic!("still in flight"));
        assert!(matches!(lookup, CacheLookup::Pending(s) if s.ptr_eq(&current)));
    }

    #[test]
    fn test_purge_drops_only_expired_settlements() {
        let cache = RefreshCache::new();
        let shared = ready(refreshed("https://x/1")).shared();
        cache
            .entries
            .insert("old".to_string(), CacheSlot::Settled {
                outcome: refreshed("https://x/0"),
                valid_until: now() - Duration::seconds(1),
            });
        cache
            .entries
            .insert("running".to_string(), CacheSlot::InFlight(shared));

        cache.purge_expired(now());
        assert_eq!(cache.len(), 1);
        assert!(cache.entries.contains_key("running"));
    }
}
