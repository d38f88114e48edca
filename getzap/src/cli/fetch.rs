// getzap/src/cli/fetch.rs
use clap::Args;
use colored::Colorize;
use getzap_common::config::Config;
use getzap_common::error::{GetZapError, Result};
use getzap_common::model::{HostPlatform, Outcome, ReleaseIdentifier};
use getzap_core::resolver::{AssetSelector, FallbackResolver, Resolution, ResolveOptions};
use getzap_net::tier::{CacheTier, OriginTier};
use getzap_net::{ArtifactoryClient, GithubClient, TransferEngine};
use tracing::debug;

use crate::cli::{artifactory_client, github_client};

const DEFAULT_SUFFIX: &str = ".zip";

#[derive(Args, Debug, Clone)]
pub struct Fetch {
    /// Only fetch assets whose name ends with this suffix (empty for any)
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
}

impl Default for Fetch {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl Fetch {
    pub fn run(&self, config: &Config) -> Result<()> {
        let cache = if config.use_rt {
            Some(artifactory_client(config)?)
        } else {
            None
        };
        let origin = if config.use_gh {
            Some(github_client(config)?)
        } else {
            None
        };
        resolve_and_report(config, cache.as_ref(), origin.as_ref(), Some(&self.suffix))
    }
}

/// Drives a resolver over the given tiers and prints the result.
pub(crate) fn resolve_and_report(
    config: &Config,
    cache: Option<&ArtifactoryClient>,
    origin: Option<&GithubClient>,
    suffix: Option<&str>,
) -> Result<()> {
    let id = config.github.release_identifier();
    let transfer = TransferEngine::new(config.transfer.clone())?;
    let options = ResolveOptions {
        local_root: config.local_root().to_path_buf(),
        host: HostPlatform::current(),
        assets: config
            .github
            .asset
            .parse()
            .unwrap_or(AssetSelector::Local),
        suffix: suffix.filter(|s| !s.is_empty()).map(str::to_string),
    };

    if origin.is_some() {
        println!(
            "Retrieving release '{}' of repo '{}/{}' for the platform '{}'...",
            id, config.github.owner, config.github.repo, options.host
        );
    }

    let resolver = FallbackResolver::new(
        cache.map(|c| c as &dyn CacheTier),
        origin.map(|o| o as &dyn OriginTier),
        &transfer,
        options,
    );
    let resolution = resolver.resolve(&id)?;
    debug!("Resolver path: {:?}", resolution.path);
    report(&id, &resolution)
}

fn report(id: &ReleaseIdentifier, resolution: &Resolution) -> Result<()> {
    if let Some(Err(e)) = &resolution.repopulation {
        eprintln!(
            "{} Could not cache the assets in Artifactory: {}",
            "Warning:".yellow().bold(),
            e
        );
    }

    match &resolution.outcome {
        Outcome::NothingToDo => {
            println!(
                "{}",
                "Neither Artifactory nor Github are enabled, nothing to do.".yellow()
            );
            Ok(())
        }
        Outcome::Retrieved { tier, files } => {
            println!(
                "{} {} file(s) from {}:",
                "Retrieved".green().bold(),
                files.len(),
                tier
            );
            for file in files {
                println!("  {}", file.display());
            }
            if let Some(Ok(count)) = &resolution.repopulation {
                println!("Uploaded {count} file(s) to Artifactory for caching.");
            }
            Ok(())
        }
        Outcome::CacheMiss => Err(GetZapError::NotFound(format!(
            "release '{id}' in Artifactory"
        ))),
        Outcome::OriginMiss { release } => Err(GetZapError::NotFound(format!(
            "matching assets for release '{release}' on GitHub"
        ))),
    }
}
