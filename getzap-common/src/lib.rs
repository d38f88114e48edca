// getzap-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;

// Re-export key types
pub use config::Config;
pub use error::{GetZapError, Result};
pub use model::{
    AssetBody, AssetRecord, HostPlatform, Outcome, PlatformTag, ReleaseIdentifier, ReleaseRecord,
    RepositoryPattern, Tier, TransferOptions, TransferRequest, TransferSource,
};
