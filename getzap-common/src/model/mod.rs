// getzap-common/src/model/mod.rs
pub mod outcome;
pub mod pattern;
pub mod platform;
pub mod release;
pub mod transfer;

pub use outcome::{Outcome, Tier};
pub use pattern::RepositoryPattern;
pub use platform::{HostPlatform, PlatformTag};
pub use release::{AssetRecord, ReleaseIdentifier, ReleaseRecord};
pub use transfer::{AssetBody, TransferOptions, TransferRequest, TransferSource};
