// getzap/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use getzap_common::config::{self, Config};
use getzap_common::error::Result;
use getzap_net::{ArtifactoryClient, GithubClient};
use tracing::debug;

pub mod fetch;
pub mod gh;
pub mod list;
pub mod rt;
pub mod selfcheck;

use crate::cli::fetch::Fetch;
use crate::cli::gh::Gh;
use crate::cli::list::List;
use crate::cli::rt::Rt;
use crate::cli::selfcheck::SelfCheck;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "get-zap", bin_name = "get-zap")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON config file (defaults to $HOME/.get_zap.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Per-invocation overrides of configuration keys. Flags win over the
/// environment and the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Settings {
    /// GitHub owner of the repository
    #[arg(long = "ghOwner", global = true)]
    pub gh_owner: Option<String>,
    /// GitHub repository name
    #[arg(long = "ghRepo", global = true)]
    pub gh_repo: Option<String>,
    /// GitHub API token
    #[arg(long = "ghToken", global = true)]
    pub gh_token: Option<String>,
    /// Release tag, 'latest' or 'all'
    #[arg(long = "ghRelease", global = true)]
    pub gh_release: Option<String>,
    /// Asset selection: 'local', 'all' or an exact asset name
    #[arg(long = "ghAsset", global = true)]
    pub gh_asset: Option<String>,
    /// GitHub API base URL
    #[arg(long = "ghApiUrl", global = true)]
    pub gh_api_url: Option<String>,
    /// Artifactory base URL
    #[arg(long = "rtUrl", global = true)]
    pub rt_url: Option<String>,
    /// Artifactory API key
    #[arg(long = "rtApiKey", global = true)]
    pub rt_api_key: Option<String>,
    /// Artifactory user
    #[arg(long = "rtUser", global = true)]
    pub rt_user: Option<String>,
    /// Artifactory repository
    #[arg(long = "rtRepo", global = true)]
    pub rt_repo: Option<String>,
    /// Base folder inside the Artifactory repository
    #[arg(long = "rtPath", global = true)]
    pub rt_path: Option<String>,
    /// Use the Artifactory cache (true/false)
    #[arg(long = "useRt", global = true, value_name = "BOOL")]
    pub use_rt: Option<String>,
    /// Use GitHub (true/false)
    #[arg(long = "useGh", global = true, value_name = "BOOL")]
    pub use_gh: Option<String>,
    /// Directory release folders are written into
    #[arg(long = "localRoot", global = true, value_name = "DIR")]
    pub local_root: Option<String>,
    /// Skip TLS certificate verification
    #[arg(long = "skipCertCheck", global = true, value_name = "BOOL")]
    pub skip_cert_check: Option<String>,
    /// Allow plain HTTP transfers
    #[arg(long = "allowHttp", global = true, value_name = "BOOL")]
    pub allow_http: Option<String>,
    /// Proxy URL for all traffic
    #[arg(long, global = true, value_name = "URL")]
    pub proxy: Option<String>,
    /// Show transfer progress
    #[arg(long = "showProgress", global = true, value_name = "BOOL")]
    pub show_progress: Option<String>,
}

impl Settings {
    fn pairs(&self) -> [(&'static str, Option<&String>); 18] {
        [
            (config::KEY_GH_OWNER, self.gh_owner.as_ref()),
            (config::KEY_GH_REPO, self.gh_repo.as_ref()),
            (config::KEY_GH_TOKEN, self.gh_token.as_ref()),
            (config::KEY_GH_RELEASE, self.gh_release.as_ref()),
            (config::KEY_GH_ASSET, self.gh_asset.as_ref()),
            (config::KEY_GH_API_URL, self.gh_api_url.as_ref()),
            (config::KEY_RT_URL, self.rt_url.as_ref()),
            (config::KEY_RT_API_KEY, self.rt_api_key.as_ref()),
            (config::KEY_RT_USER, self.rt_user.as_ref()),
            (config::KEY_RT_REPO, self.rt_repo.as_ref()),
            (config::KEY_RT_PATH, self.rt_path.as_ref()),
            (config::KEY_USE_RT, self.use_rt.as_ref()),
            (config::KEY_USE_GH, self.use_gh.as_ref()),
            (config::KEY_LOCAL_ROOT, self.local_root.as_ref()),
            (config::KEY_SKIP_CERT_CHECK, self.skip_cert_check.as_ref()),
            (config::KEY_ALLOW_HTTP, self.allow_http.as_ref()),
            (config::KEY_PROXY, self.proxy.as_ref()),
            (config::KEY_SHOW_PROGRESS, self.show_progress.as_ref()),
        ]
    }

    pub fn apply(&self, config: &mut Config) -> Result<()> {
        for (key, value) in self.pairs() {
            if let Some(value) = value {
                debug!("Applying command line override for {}", key);
                config.set(key, value)?;
            }
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Retrieves an artifact from the Artifactory cache or from GitHub,
    /// wherever it can be found, and caches GitHub downloads.
    Fetch(Fetch),
    /// Lists releases, or the assets of one release.
    List(List),
    /// Direct GitHub operations.
    Gh(Gh),
    /// Direct Artifactory operations.
    Rt(Rt),
    /// Checks connectivity of the configured tiers.
    #[command(name = "selfcheck")]
    SelfCheck(SelfCheck),
}

impl Default for Command {
    fn default() -> Self {
        Command::Fetch(Fetch::default())
    }
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Fetch(command) => command.run(config),
            Self::List(command) => command.run(config),
            Self::Gh(command) => command.run(config),
            Self::Rt(command) => command.run(config),
            Self::SelfCheck(command) => command.run(config),
        }
    }
}

pub(crate) fn github_client(config: &Config) -> Result<GithubClient> {
    GithubClient::new(config.github.clone(), &config.transfer)
}

pub(crate) fn artifactory_client(config: &Config) -> Result<ArtifactoryClient> {
    ArtifactoryClient::new(config.artifactory.clone(), &config.transfer)
}
