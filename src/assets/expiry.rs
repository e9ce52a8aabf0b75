//! Staleness check for asset references.

use super::{AssetReference, AssetState};
use chrono::{DateTime, Duration, Utc};

/// True when `expiry` falls inside the safety margin around `now`.
///
/// The boundary is inclusive: an expiry exactly `margin` away is already
/// stale.
pub fn is_stale(expiry: DateTime<Utc>, now: DateTime<Utc>, margin: Duration) -> bool {
    match now.checked_add_signed(margin) {
        Some(threshold) => expiry <= threshold,
        None => true,
    }
}

/// Initial state of a reference: `Fresh` when it has no expiry or the
/// expiry is strictly later than `now + margin`, else
/// `ExpiredPendingRefresh`.
pub fn evaluate(reference: &AssetReference, now: DateTime<Utc>, margin: Duration) -> AssetState {
    match reference.expiry_time {
        Some(expiry) if is_stale(expiry, now, margin) => AssetState::ExpiredPendingRefresh,
        _ => AssetState::Fresh,
    }
}
