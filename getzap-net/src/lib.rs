// getzap-net/src/lib.rs
pub mod artifactory;
pub mod github;
pub mod http;
pub mod tier;
pub mod transfer;
pub mod validation;

pub use artifactory::ArtifactoryClient;
pub use github::GithubClient;
pub use tier::{CacheTier, OriginTier};
pub use transfer::{copy_chunked, copy_stream, Downloaded, TransferEngine};
pub use validation::{compute_sha256, safe_join, validate_url, verify_checksum};
