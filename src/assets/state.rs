use super::AssetReference;
use serde::Serialize;
use std::fmt;

/// Lifecycle of one asset as seen by the rendering surface.
///
/// `Fresh` and `ExpiredPendingRefresh` are initial states. `Refreshed`,
/// `RefreshFailed` and `LoadFailed` are terminal for the lifetime of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetState {
    Fresh,
    ExpiredPendingRefresh,
    Refreshed,
    RefreshFailed,
    LoadFailed,
}

impl AssetState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssetState::Refreshed | AssetState::RefreshFailed | AssetState::LoadFailed
        )
    }

    /// Whether the surface should show the placeholder instead of the asset.
    pub fn shows_placeholder(&self) -> bool {
        matches!(self, AssetState::RefreshFailed | AssetState::LoadFailed)
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetState::Fresh => "fresh",
            AssetState::ExpiredPendingRefresh => "expired_pending_refresh",
            AssetState::Refreshed => "refreshed",
            AssetState::RefreshFailed => "refresh_failed",
            AssetState::LoadFailed => "load_failed",
        };
        write!(f, "{}", name)
    }
}

/// What the surface should display for an asset right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAsset {
    /// Never empty; the placeholder when nothing better exists.
    pub display_url: String,
    pub state: AssetState,
    /// True while a refresh for this asset is outstanding.
    pub is_refreshing: bool,
    /// Best-known reference: the input, or the renewed one after a refresh.
    pub reference: AssetReference,
}
