// getzap-core/src/resolver.rs
//! Cache-first, origin-fallback resolution of one release request.
//!
//! The resolver is an explicit state machine. Each tier is attempted at most
//! once per request and nothing is retried; the visited states are recorded
//! so callers and tests can see which path was taken.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use getzap_common::error::{GetZapError, Result};
use getzap_common::model::{
    AssetRecord, HostPlatform, Outcome, ReleaseIdentifier, RepositoryPattern, Tier,
    TransferRequest,
};
use getzap_net::tier::{CacheTier, OriginTier};
use getzap_net::transfer::TransferEngine;
use getzap_net::validation::safe_join;
use tracing::{debug, error, info, warn};

use crate::platform::is_local_asset;

/// Which assets of a release the origin fetch keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSelector {
    /// Only assets whose name matches the host platform.
    Local,
    All,
    /// Exactly one asset, by name.
    Named(String),
}

impl FromStr for AssetSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "local" | "" => AssetSelector::Local,
            "all" => AssetSelector::All,
            name => AssetSelector::Named(name.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Release folders are created below this directory.
    pub local_root: PathBuf,
    pub host: HostPlatform,
    pub assets: AssetSelector,
    /// When set, only asset names ending with it are fetched.
    pub suffix: Option<String>,
}

impl ResolveOptions {
    pub fn new(local_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            host: HostPlatform::current(),
            assets: AssetSelector::Local,
            suffix: None,
        }
    }

    fn selects(&self, asset: &AssetRecord) -> bool {
        if let Some(suffix) = &self.suffix {
            if !asset.name.ends_with(suffix.as_str()) {
                info!(
                    "Skipping asset '{}' as it does not have the suffix '{}'.",
                    asset.name, suffix
                );
                return false;
            }
        }
        match &self.assets {
            AssetSelector::All => true,
            AssetSelector::Named(name) => asset.name == *name,
            AssetSelector::Local => {
                let local = is_local_asset(&asset.name, &self.host);
                if !local {
                    info!(
                        "Skipping asset '{}' as it does not match the local platform.",
                        asset.name
                    );
                }
                local
            }
        }
    }
}

#[derive(Debug)]
enum State {
    Start,
    CacheProbe,
    OriginFetch { repopulate: bool },
    CacheRepopulate { release: String, files: Vec<PathBuf> },
    Done {
        outcome: Outcome,
        /// Upload result, present only after `CacheRepopulate`.
        repopulation: Option<Result<usize>>,
    },
    Failed(GetZapError),
}

/// Payload-free name of a resolver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Start,
    CacheProbe,
    OriginFetch,
    CacheRepopulate,
    Done,
    Failed,
}

impl State {
    fn done(outcome: Outcome) -> Self {
        State::Done {
            outcome,
            repopulation: None,
        }
    }

    fn kind(&self) -> StateKind {
        match self {
            State::Start => StateKind::Start,
            State::CacheProbe => StateKind::CacheProbe,
            State::OriginFetch { .. } => StateKind::OriginFetch,
            State::CacheRepopulate { .. } => StateKind::CacheRepopulate,
            State::Done { .. } => StateKind::Done,
            State::Failed(_) => StateKind::Failed,
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Start => "start",
            StateKind::CacheProbe => "cache-probe",
            StateKind::OriginFetch => "origin-fetch",
            StateKind::CacheRepopulate => "cache-repopulate",
            StateKind::Done => "done",
            StateKind::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a finished resolution produced.
#[derive(Debug)]
pub struct Resolution {
    pub outcome: Outcome,
    /// Set only when a cache repopulation was attempted. Its failure never
    /// changes `outcome`.
    pub repopulation: Option<Result<usize>>,
    /// Every state visited, in order, ending with `Done`.
    pub path: Vec<StateKind>,
}

impl Resolution {
    /// Misses end the state machine normally but leave the user without the
    /// artifact.
    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, Outcome::CacheMiss | Outcome::OriginMiss { .. })
    }
}

pub struct FallbackResolver<'a> {
    cache: Option<&'a dyn CacheTier>,
    origin: Option<&'a dyn OriginTier>,
    transfer: &'a TransferEngine,
    options: ResolveOptions,
}

impl<'a> FallbackResolver<'a> {
    /// A tier passed as `None` is disabled for this resolver.
    pub fn new(
        cache: Option<&'a dyn CacheTier>,
        origin: Option<&'a dyn OriginTier>,
        transfer: &'a TransferEngine,
        options: ResolveOptions,
    ) -> Self {
        Self {
            cache,
            origin,
            transfer,
            options,
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Runs the state machine to a terminal state. `Failed` is returned as
    /// `Err`, everything else as a `Resolution`.
    pub fn resolve(&self, id: &ReleaseIdentifier) -> Result<Resolution> {
        let mut state = State::Start;
        let mut path = vec![StateKind::Start];

        loop {
            match state {
                State::Done {
                    outcome,
                    repopulation,
                } => {
                    info!("Resolution of '{}' finished: {:?}", id, outcome);
                    return Ok(Resolution {
                        outcome,
                        repopulation,
                        path,
                    });
                }
                State::Failed(err) => {
                    error!("Resolution of '{}' failed: {}", id, err);
                    return Err(err);
                }
                active => {
                    state = self.step(active, id);
                    debug!("Resolver entered state {}", state.kind());
                    path.push(state.kind());
                }
            }
        }
    }

    /// One transition. Terminal states map to themselves.
    fn step(&self, state: State, id: &ReleaseIdentifier) -> State {
        match state {
            State::Start => self.start(id),
            State::CacheProbe => self.probe_cache(id),
            State::OriginFetch { repopulate } => self.fetch_origin(id, repopulate),
            State::CacheRepopulate { release, files } => {
                let repopulation = Some(self.repopulate(&release, &files));
                State::Done {
                    outcome: Outcome::Retrieved {
                        tier: Tier::Origin,
                        files,
                    },
                    repopulation,
                }
            }
            State::Done {
                outcome,
                repopulation,
            } => State::Done {
                outcome,
                repopulation,
            },
            State::Failed(err) => State::Failed(err),
        }
    }

    fn start(&self, id: &ReleaseIdentifier) -> State {
        match (self.cache.is_some(), self.origin.is_some()) {
            (false, false) => {
                info!("Neither Artifactory nor Github are enabled, nothing to do.");
                State::done(Outcome::NothingToDo)
            }
            (true, false) if !id.is_pinned() => {
                State::Failed(GetZapError::UnsupportedCacheQuery(id.to_string()))
            }
            (true, false) => State::CacheProbe,
            (false, true) => State::OriginFetch { repopulate: false },
            (true, true) if !id.is_pinned() => {
                info!("Artifactory does not cache '{}' releases. Downloading from github.", id);
                State::OriginFetch { repopulate: false }
            }
            (true, true) => State::CacheProbe,
        }
    }

    fn probe_cache(&self, id: &ReleaseIdentifier) -> State {
        let (Some(cache), Some(tag)) = (self.cache, id.tag()) else {
            return State::Failed(GetZapError::UnsupportedCacheQuery(id.to_string()));
        };
        let fallback = self.origin.is_some();
        let pattern = RepositoryPattern::for_release(tag);
        debug!("Probing {} with pattern '{}'", cache.describe(), pattern);

        match cache.download(&pattern, &self.options.local_root) {
            Ok(files) if !files.is_empty() => {
                info!("Asset was retrieved from Artifactory.");
                State::done(Outcome::Retrieved {
                    tier: Tier::Cache,
                    files,
                })
            }
            Ok(_) if fallback => {
                info!("Asset not found in Artifactory, trying github.");
                State::OriginFetch { repopulate: true }
            }
            Ok(_) => {
                warn!("Release '{}' not found in Artifactory.", tag);
                State::done(Outcome::CacheMiss)
            }
            Err(err) if fallback && !err.is_fatal() => {
                warn!("Artifactory probe failed ({}), trying github.", err);
                State::OriginFetch { repopulate: true }
            }
            Err(err) => State::Failed(err),
        }
    }

    fn fetch_origin(&self, id: &ReleaseIdentifier, repopulate: bool) -> State {
        let Some(origin) = self.origin else {
            return State::Failed(GetZapError::Config(
                "Origin fetch requested without an origin tier".to_string(),
            ));
        };

        let release = match origin.resolve_release(id) {
            Ok(release) => release,
            Err(GetZapError::NotFound(name)) => {
                warn!("Release '{}' not found in {}", name, origin.describe());
                return State::done(Outcome::OriginMiss { release: name });
            }
            Err(err) => return State::Failed(err),
        };
        info!(
            "Downloading assets for release '{}' of repo '{}' for the platform '{}'",
            release.tag_name,
            origin.describe(),
            self.options.host
        );

        let assets = match origin.list_assets(&release) {
            Ok(assets) => assets,
            Err(err) => return State::Failed(err),
        };

        let mut files = Vec::new();
        for asset in assets.iter().filter(|asset| self.options.selects(asset)) {
            match self.fetch_asset(origin, &release.tag_name, asset) {
                Ok(path) => files.push(path),
                Err(err) => return State::Failed(err),
            }
        }

        if files.is_empty() {
            warn!("No matching assets in release '{}'", release.tag_name);
            return State::done(Outcome::OriginMiss {
                release: release.tag_name,
            });
        }

        if repopulate {
            State::CacheRepopulate {
                release: release.tag_name,
                files,
            }
        } else {
            State::done(Outcome::Retrieved {
                tier: Tier::Origin,
                files,
            })
        }
    }

    fn fetch_asset(
        &self,
        origin: &dyn OriginTier,
        tag: &str,
        asset: &AssetRecord,
    ) -> Result<PathBuf> {
        let destination = safe_join(&self.options.local_root, &format!("{tag}/{}", asset.name))?;
        info!("Downloading asset: {} [{} bytes]", asset.name, asset.size);
        let body = origin.open_asset(asset)?;
        let bytes = self
            .transfer
            .transfer(TransferRequest::new(body, destination.clone()))?;
        debug!("Wrote {} bytes to {}", bytes, destination.display());
        Ok(destination)
    }

    fn repopulate(&self, release: &str, files: &[PathBuf]) -> Result<usize> {
        let Some(cache) = self.cache else {
            return Ok(0);
        };
        info!("Uploading assets to Artifactory for caching.");
        let pattern = RepositoryPattern::for_release(release);
        let result = cache.upload(&pattern, files);
        match &result {
            Ok(count) => info!("Cached {} file(s) under '{}'", count, pattern),
            Err(err) => warn!("Failed to repopulate Artifactory: {}", err),
        }
        result
    }
}
