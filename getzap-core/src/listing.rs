// getzap-core/src/listing.rs
use getzap_common::error::Result;
use getzap_common::model::{AssetRecord, ReleaseIdentifier, ReleaseRecord};
use getzap_net::tier::OriginTier;
use tracing::debug;

/// What `list` shows: every release for `all`, otherwise one release with
/// its assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseListing {
    Releases(Vec<ReleaseRecord>),
    Release {
        release: ReleaseRecord,
        assets: Vec<AssetRecord>,
    },
}

pub fn list_releases(origin: &dyn OriginTier, id: &ReleaseIdentifier) -> Result<ReleaseListing> {
    debug!("Listing '{}' for {}", id, origin.describe());
    match id {
        ReleaseIdentifier::All => origin.list_releases().map(ReleaseListing::Releases),
        pinned_or_latest => {
            let release = origin.resolve_release(pinned_or_latest)?;
            let assets = origin.list_assets(&release)?;
            Ok(ReleaseListing::Release { release, assets })
        }
    }
}
