// getzap/src/cli/list.rs
use clap::Args;
use colored::Colorize;
use getzap_common::config::Config;
use getzap_common::error::Result;
use getzap_common::model::ReleaseIdentifier;
use getzap_core::listing::{list_releases, ReleaseListing};
use prettytable::{format, Cell, Row, Table};

use crate::cli::github_client;

#[derive(Args, Debug, Clone, Default)]
pub struct List {
    /// List every release, ignoring --ghRelease
    #[arg(long)]
    pub all: bool,
}

impl List {
    pub fn run(&self, config: &Config) -> Result<()> {
        let id = if self.all {
            ReleaseIdentifier::All
        } else {
            config.github.release_identifier()
        };
        let origin = github_client(config)?;
        let repo = format!("{}/{}", config.github.owner, config.github.repo);

        match list_releases(&origin, &id)? {
            ReleaseListing::Releases(releases) => {
                println!("Listing all releases of repo '{repo}':");
                if releases.is_empty() {
                    println!("{}", "No releases found".yellow());
                    return Ok(());
                }
                let mut table = Table::new();
                table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
                table.add_row(Row::new(vec![
                    Cell::new("Release").style_spec("b"),
                    Cell::new("Published").style_spec("b"),
                ]));
                for release in &releases {
                    table.add_row(Row::new(vec![
                        Cell::new(&release.tag_name).style_spec("Fg"),
                        Cell::new(&release.published_display()),
                    ]));
                }
                table.printstd();
            }
            ReleaseListing::Release { release, assets } => {
                println!("Viewing release '{}' of repo '{repo}':", release.tag_name);
                println!(
                    "  {}  [Published: {}]",
                    release.tag_name.green().bold(),
                    release.created_display()
                );
                let mut table = Table::new();
                table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
                for asset in &assets {
                    table.add_row(Row::new(vec![
                        Cell::new(&format!("  {}", asset.name)),
                        Cell::new(&format!("{} bytes", asset.size)).style_spec("r"),
                    ]));
                }
                table.printstd();
            }
        }
        Ok(())
    }
}
