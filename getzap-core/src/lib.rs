// getzap-core/src/lib.rs

pub mod listing;
pub mod platform;
pub mod resolver;
pub mod selfcheck;

pub use listing::{list_releases, ReleaseListing};
pub use platform::{determine_tag, is_local_asset, matches};
pub use resolver::{AssetSelector, FallbackResolver, Resolution, ResolveOptions, StateKind};
pub use selfcheck::{run_selfcheck, CheckReport, CheckStatus};
