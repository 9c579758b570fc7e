use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use concordia_stats::pairwise::{CorrMode, PairRule};

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(
    name = "concordia",
    version,
    about = "Cross-method gene expression concordance",
    propagate_version = true
)]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List distinct experiments (method, raw label, normalized condition) as TSV
    Identities {
        #[arg(short, long)]
        config: PathBuf,

        /// Keep raw labels instead of canonical "<time> <regime>" conditions
        #[arg(long)]
        no_auto_normalize: bool,
    },
    /// Build matrices, group experiments and correlate methods
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(short, long)]
    pub config: PathBuf,

    /// Significance threshold for the pair rule
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Which p-values must pass alpha: both, any or none
    #[arg(long)]
    pub pair_rule: Option<PairRule>,

    /// auto, pearson, spearman or kendall
    #[arg(long)]
    pub corr_mode: Option<CorrMode>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub no_auto_normalize: bool,
}

impl RunArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            alpha: self.alpha,
            pair_rule: self.pair_rule,
            corr_mode: self.corr_mode,
            output_dir: self.output_dir.clone(),
            no_auto_normalize: self.no_auto_normalize,
        }
    }
}
