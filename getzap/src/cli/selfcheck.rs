// getzap/src/cli/selfcheck.rs
use clap::Args;
use colored::Colorize;
use getzap_common::config::Config;
use getzap_common::error::{GetZapError, Result};
use getzap_core::selfcheck::{run_selfcheck, CheckReport, CheckStatus};
use getzap_net::tier::{CacheTier, OriginTier};

use crate::cli::{artifactory_client, github_client};

#[derive(Args, Debug, Clone, Default)]
pub struct SelfCheck {}

impl SelfCheck {
    pub fn run(&self, config: &Config) -> Result<()> {
        let mut setup_failures = Vec::new();
        let origin = if config.use_gh {
            github_client(config)
                .map_err(|e| setup_failures.push(("GitHub", e)))
                .ok()
        } else {
            None
        };
        let cache = if config.use_rt {
            artifactory_client(config)
                .map_err(|e| setup_failures.push(("Artifactory", e)))
                .ok()
        } else {
            None
        };

        let mut report = run_selfcheck(
            origin.as_ref().map(|o| o as &dyn OriginTier),
            cache.as_ref().map(|c| c as &dyn CacheTier),
        );
        for (name, err) in setup_failures {
            if let Some(entry) = report.checks.iter_mut().find(|(n, _)| n == name) {
                entry.1 = CheckStatus::Failed(err.to_string());
            }
        }

        print_report(&report);
        if report.all_passed() {
            Ok(())
        } else {
            Err(GetZapError::Network("Self check failed".to_string()))
        }
    }
}

fn print_report(report: &CheckReport) {
    for (name, status) in &report.checks {
        match status {
            CheckStatus::Passed(detail) => println!("{} {}: {}", "✓".green(), name, detail),
            CheckStatus::Failed(detail) => println!("{} {}: {}", "✗".red(), name, detail),
            CheckStatus::Skipped => println!("{} {}: disabled", "-".dimmed(), name),
        }
    }
}
