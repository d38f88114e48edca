// getzap/src/cli/gh.rs
use clap::{Args, Subcommand};
use getzap_common::config::Config;
use getzap_common::error::Result;

use crate::cli::fetch::resolve_and_report;
use crate::cli::github_client;

#[derive(Args, Debug, Clone)]
pub struct Gh {
    #[command(subcommand)]
    pub command: GhCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GhCommand {
    /// Downloads release assets straight from GitHub, bypassing Artifactory.
    Download(GhDownload),
}

#[derive(Args, Debug, Clone)]
pub struct GhDownload {
    /// Only download assets whose name ends with this suffix
    #[arg(long)]
    pub suffix: Option<String>,
}

impl Gh {
    pub fn run(&self, config: &Config) -> Result<()> {
        match &self.command {
            GhCommand::Download(command) => command.run(config),
        }
    }
}

impl GhDownload {
    pub fn run(&self, config: &Config) -> Result<()> {
        let origin = github_client(config)?;
        resolve_and_report(config, None, Some(&origin), self.suffix.as_deref())
    }
}
