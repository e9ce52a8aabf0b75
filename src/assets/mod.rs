//! Expiring asset handling: deciding when a Notion-hosted URL is stale and
//! renewing it from the origin.

pub mod cache;
pub mod clock;
pub mod expiry;
pub mod mirror;
mod reference;
pub mod refresh;
pub mod resolver;
mod slot;
mod state;

pub use cache::{RefreshCache, RefreshOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use mirror::ImageMirror;
pub use reference::{presigned_expiry, AssetOwner, AssetReference};
pub use refresh::{OriginRefreshClient, RefreshClient, RefreshError, RefreshedAsset};
pub use resolver::{AssetResolver, ResolverConfig};
pub use slot::AssetSlot;
pub use state::{AssetState, ResolvedAsset};
