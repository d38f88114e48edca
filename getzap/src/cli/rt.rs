// getzap/src/cli/rt.rs
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use colored::Colorize;
use getzap_common::config::Config;
use getzap_common::error::{GetZapError, Result};
use getzap_common::model::RepositoryPattern;
use getzap_net::tier::CacheTier;
use tracing::debug;
use walkdir::WalkDir;

use crate::cli::artifactory_client;

#[derive(Args, Debug, Clone)]
pub struct Rt {
    #[command(subcommand)]
    pub command: RtCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RtCommand {
    /// Downloads every file matching a pattern into the local root.
    Download(RtDownload),
    /// Uploads files to Artifactory.
    Upload(RtUpload),
    /// Deletes files matching a pattern.
    Delete(RtDelete),
}

impl Rt {
    pub fn run(&self, config: &Config) -> Result<()> {
        match &self.command {
            RtCommand::Download(command) => command.run(config),
            RtCommand::Upload(command) => command.run(config),
            RtCommand::Delete(command) => command.run(config),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RtDownload {
    /// Repository path or glob pattern, e.g. 'v2024.01.01/**'
    #[arg(short, long)]
    pub file: String,
}

impl RtDownload {
    pub fn run(&self, config: &Config) -> Result<()> {
        let cache = artifactory_client(config)?;
        let pattern = RepositoryPattern::new(self.file.as_str());
        let files = cache.download(&pattern, config.local_root())?;
        if files.is_empty() {
            println!("{} '{}'", "No files matched".yellow(), pattern);
            return Ok(());
        }
        println!("{} {} file(s):", "Downloaded".green().bold(), files.len());
        for file in files {
            println!("  {}", file.display());
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RtUpload {
    /// Files or directories to upload
    #[arg(short, long, required = true, num_args = 1..)]
    pub file: Vec<PathBuf>,

    /// Target folder in the repository (defaults to the --ghRelease tag)
    #[arg(long)]
    pub target: Option<String>,
}

impl RtUpload {
    pub fn run(&self, config: &Config) -> Result<()> {
        let folder = match (&self.target, config.github.release_identifier().tag()) {
            (Some(target), _) => target.clone(),
            (None, Some(tag)) => tag.to_string(),
            (None, None) => {
                return Err(GetZapError::Config(
                    "Specify --target or a concrete --ghRelease for uploads".to_string(),
                ))
            }
        };
        let files = expand_files(&self.file)?;
        let cache = artifactory_client(config)?;
        let count = cache.upload(&RepositoryPattern::new(folder.as_str()), &files)?;
        println!(
            "{} {} file(s) to {}",
            "Uploaded".green().bold(),
            count,
            folder
        );
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RtDelete {
    /// Repository path or glob pattern to delete
    #[arg(short, long)]
    pub file: String,
}

impl RtDelete {
    pub fn run(&self, config: &Config) -> Result<()> {
        let cache = artifactory_client(config)?;
        let pattern = RepositoryPattern::new(self.file.as_str());
        let count = cache.delete(&pattern)?;
        println!("{} {} file(s) matching '{}'", "Deleted".green().bold(), count, pattern);
        Ok(())
    }
}

/// Replaces directories by the regular files below them.
fn expand_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(not_found(path));
        }
    }
    debug!("Upload set: {:?}", files);
    Ok(files)
}

fn not_found(path: &Path) -> GetZapError {
    GetZapError::NotFound(path.display().to_string())
}
