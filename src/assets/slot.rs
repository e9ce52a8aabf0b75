//! Per-component holder for one asset and its state.
//!
//! A slot is owned by whatever displays the asset. Refresh results that
//! arrive after the slot was given a new reference, or torn down, are
//! discarded instead of being applied to the wrong asset.

use super::{AssetReference, AssetResolver, AssetState, ResolvedAsset};
use parking_lot::Mutex;

struct SlotState {
    current: ResolvedAsset,
    /// Bumped whenever the reference changes or the slot is torn down.
    generation: u64,
    torn_down: bool,
}

pub struct AssetSlot {
    state: Mutex<SlotState>,
}

impl AssetSlot {
    /// A slot showing `reference` in its initial state.
    pub fn new(reference: &AssetReference, resolver: &AssetResolver) -> Self {
        Self {
            state: Mutex::new(SlotState {
                current: resolver.initial(reference),
                generation: 0,
                torn_down: false,
            }),
        }
    }

    /// What the slot displays right now.
    pub fn current(&self) -> ResolvedAsset {
        self.state.lock().current.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.lock().torn_down
    }

    /// Points the slot at a different asset. Any refresh still running for
    /// the previous reference will be discarded.
    pub fn replace(&self, reference: &AssetReference, resolver: &AssetResolver) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.current = resolver.initial(reference);
    }

    /// Stops accepting updates.
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.torn_down = true;
    }

    /// Runs the pending refresh, if any, and applies its result.
    ///
    /// Returns the slot's state afterwards, or `None` when the result was
    /// discarded because the slot moved on while the refresh was running.
    /// Slots that are not waiting on a refresh are returned unchanged;
    /// in particular a `Refreshed` asset is not evaluated again.
    pub async fn refresh(&self, resolver: &AssetResolver) -> Option<ResolvedAsset> {
        let (ticket, reference) = {
            let state = self.state.lock();
            if state.torn_down {
                return None;
            }
            if state.current.state != AssetState::ExpiredPendingRefresh {
                return Some(state.current.clone());
            }
            (state.generation, state.current.reference.clone())
        };

        let resolved = resolver.resolve(&reference).await;

        let mut state = self.state.lock();
        if state.torn_down || state.generation != ticket {
            log::debug!(
                "Discarding refresh result for {}: slot changed while waiting",
                reference.cache_key()
            );
            return None;
        }
        if state.current.state == AssetState::LoadFailed {
            return Some(state.current.clone());
        }
        state.current = resolved;
        Some(state.current.clone())
    }

    /// Records that the surface could not load the asset. Terminal.
    pub fn report_load_failure(&self, resolver: &AssetResolver) -> ResolvedAsset {
        let mut state = self.state.lock();
        let failed = resolver.load_failed(&state.current.reference);
        state.current = failed;
        state.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::clock::ManualClock;
    use crate::assets::{
        AssetOwner, RefreshCache, RefreshClient, RefreshError, RefreshedAsset, ResolverConfig,
    };
    use crate::constants::PLACEHOLDER_URL;
    use crate::types::BlockId;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;

    struct SlowClient;

    #[async_trait::async_trait]
    impl RefreshClient for SlowClient {
        async fn fetch_owner(
            &self,
            owner: &AssetOwner,
        ) -> Result<Option<RefreshedAsset>, RefreshError> {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            Ok(Some(RefreshedAsset {
                url: format!("https://s3.amazonaws.com/{}.png", owner.key()),
                expiry_time: None,
            }))
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn resolver() -> AssetResolver {
        AssetResolver::new(
            Arc::new(SlowClient),
            Arc::new(RefreshCache::new()),
            ResolverConfig::default(),
        )
        .with_clock(Arc::new(ManualClock::new(start())))
    }

    fn expired(owner: &str) -> AssetReference {
        AssetReference::new(format!("https://s3.amazonaws.com/{}-old.png", owner))
            .expiring_at(Some(start() - Duration::minutes(1)))
            .owned_by(AssetOwner::Block(BlockId::opaque(owner).unwrap()))
    }

    #[tokio::test]
    async fn test_refresh_applies_to_current_reference() {
        let resolver = resolver();
        let slot = AssetSlot::new(&expired("a"), &resolver);
        assert!(slot.current().is_refreshing);

        let after = slot.refresh(&resolver).await.unwrap();
        assert_eq!(after.state, AssetState::Refreshed);
        assert_eq!(after.display_url, "https://s3.amazonaws.com/block:a.png");
        assert_eq!(slot.current(), after);
    }

    #[tokio::test]
    async fn test_result_for_replaced_reference_is_discarded() {
        let resolver = resolver();
        let slot = AssetSlot::new(&expired("a"), &resolver);
        let fresh = AssetReference::new("https://cdn.example/b.png");

        let (outcome, _) = tokio::join!(slot.refresh(&resolver), async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            slot.replace(&fresh, &resolver);
        });

        assert_eq!(outcome, None);
        assert_eq!(slot.current().display_url, "https://cdn.example/b.png");
        assert_eq!(slot.current().state, AssetState::Fresh);
    }

    #[tokio::test]
    async fn test_torn_down_slot_ignores_late_result() {
        let resolver = resolver();
        let slot = AssetSlot::new(&expired("a"), &resolver);

        let (outcome, _) = tokio::join!(slot.refresh(&resolver), async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            slot.teardown();
        });

        assert_eq!(outcome, None);
        assert!(slot.is_torn_down());
        assert_eq!(slot.current().state, AssetState::ExpiredPendingRefresh);
    }

    #[tokio::test]
    async fn test_refreshed_slot_is_not_evaluated_again() {
        let resolver = resolver();
        let slot = AssetSlot::new(&expired("a"), &resolver);
        let first = slot.refresh(&resolver).await.unwrap();
        let second = slot.refresh(&resolver).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_load_failure_is_terminal() {
        let resolver = resolver();
        let slot = AssetSlot::new(&AssetReference::new("https://cdn.example/a.png"), &resolver);

        let failed = slot.report_load_failure(&resolver);
        assert_eq!(failed.state, AssetState::LoadFailed);
        assert_eq!(failed.display_url, PLACEHOLDER_URL);
        assert_eq!(slot.refresh(&resolver).await.unwrap().state, AssetState::LoadFailed);
    }
}
