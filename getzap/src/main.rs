// getzap/src/main.rs
use std::process;

use clap::Parser;
use colored::Colorize;
use getzap_common::config::Config;
use getzap_common::error::{GetZapError, Result};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{CliArgs, Command};

fn init_logging(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("GET_ZAP_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

fn load_config(cli_args: &CliArgs) -> Result<Config> {
    let mut config = Config::load(cli_args.config.as_deref())
        .map_err(|e| GetZapError::Config(format!("Could not load config: {e}")))?;
    cli_args.settings.apply(&mut config)?;
    Ok(config)
}

fn main() {
    let cli_args = CliArgs::parse();
    init_logging(cli_args.verbose);

    let result = load_config(&cli_args).and_then(|config| {
        debug!("Effective configuration: {:?}", config.redacted());
        let command = cli_args.command.clone().unwrap_or_default();
        command.run(&config)
    });

    if let Err(e) = result {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }
}

