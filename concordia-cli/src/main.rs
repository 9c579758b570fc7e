//! `concordia` command-line interface

mod cli;
mod config;
mod pipeline;

use clap::Parser;
use concordia_core::Result;
use log::{info, LevelFilter};

use cli::{Cli, Commands, RunArgs};
use config::{AnalysisConfig, Overrides};

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Identities {
            config,
            no_auto_normalize,
        } => list_identities(&config, no_auto_normalize),
        Commands::Run(args) => run_analysis(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn list_identities(path: &std::path::Path, no_auto_normalize: bool) -> Result<()> {
    let mut config = AnalysisConfig::from_path(path)?;
    config.apply(Overrides {
        no_auto_normalize,
        ..Overrides::default()
    });
    config.validate()?;
    let n = pipeline::write_identities(&config, std::io::stdout().lock())?;
    info!("{n} experiments");
    Ok(())
}

fn run_analysis(args: &RunArgs) -> Result<()> {
    let mut config = AnalysisConfig::from_path(&args.config)?;
    config.apply(args.overrides());
    let report = pipeline::run(&config)?;
    if let Some(reason) = report.stopped {
        info!("stopped early: {reason}");
    }
    Ok(())
}
