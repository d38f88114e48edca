// getzap-net/src/tier.rs
//! The two remote tiers the resolver coordinates. Both are object safe so the
//! resolver can be driven by in-memory fakes.
use std::path::{Path, PathBuf};

use getzap_common::error::Result;
use getzap_common::model::{
    AssetBody, AssetRecord, ReleaseIdentifier, ReleaseRecord, RepositoryPattern,
};

/// Authoritative source of releases (GitHub).
pub trait OriginTier {
    /// Resolves exactly one release. `All` is unsupported.
    fn resolve_release(&self, id: &ReleaseIdentifier) -> Result<ReleaseRecord>;

    fn list_releases(&self) -> Result<Vec<ReleaseRecord>>;

    /// Re-fetches the asset listing on every call.
    fn list_assets(&self, release: &ReleaseRecord) -> Result<Vec<AssetRecord>>;

    fn open_asset(&self, asset: &AssetRecord) -> Result<AssetBody>;

    fn describe(&self) -> String;
}

/// Intermediate artifact repository (Artifactory).
pub trait CacheTier {
    /// Downloads everything matching `pattern` under `local_root`, keeping the
    /// repository-relative layout. Returns the files written; an empty list
    /// is a miss.
    fn download(&self, pattern: &RepositoryPattern, local_root: &Path) -> Result<Vec<PathBuf>>;

    /// Uploads `files` into the folder named by the pattern's literal prefix.
    fn upload(&self, pattern: &RepositoryPattern, files: &[PathBuf]) -> Result<usize>;

    fn delete(&self, pattern: &RepositoryPattern) -> Result<usize>;

    fn ping(&self) -> Result<()>;

    fn describe(&self) -> String;
}
