// getzap-core/src/selfcheck.rs
//! Connectivity check of the configured tiers.
use getzap_common::model::ReleaseIdentifier;
use getzap_net::tier::{CacheTier, OriginTier};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed(String),
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub checks: Vec<(String, CheckStatus)>,
}

impl CheckReport {
    pub fn all_passed(&self) -> bool {
        !self
            .checks
            .iter()
            .any(|(_, status)| matches!(status, CheckStatus::Failed(_)))
    }
}

/// Resolves the latest origin release and pings the cache. A disabled tier is
/// reported as skipped.
pub fn run_selfcheck(
    origin: Option<&dyn OriginTier>,
    cache: Option<&dyn CacheTier>,
) -> CheckReport {
    let mut checks = Vec::with_capacity(2);

    let github = match origin {
        None => CheckStatus::Skipped,
        Some(origin) => match origin.resolve_release(&ReleaseIdentifier::Latest) {
            Ok(release) => CheckStatus::Passed(format!(
                "{}: latest release is {}",
                origin.describe(),
                release.tag_name
            )),
            Err(err) => {
                warn!("GitHub self check failed: {}", err);
                CheckStatus::Failed(format!("{}: {}", origin.describe(), err))
            }
        },
    };
    checks.push(("GitHub".to_string(), github));

    let artifactory = match cache {
        None => CheckStatus::Skipped,
        Some(cache) => match cache.ping() {
            Ok(()) => CheckStatus::Passed(format!("{} is reachable", cache.describe())),
            Err(err) => {
                warn!("Artifactory self check failed: {}", err);
                CheckStatus::Failed(format!("{}: {}", cache.describe(), err))
            }
        },
    };
    checks.push(("Artifactory".to_string(), artifactory));

    debug!("Self check finished: {:?}", checks);
    CheckReport { checks }
}
