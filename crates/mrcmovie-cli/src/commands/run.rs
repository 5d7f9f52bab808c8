use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use mrcmovie_core::io::discover_inputs;
use mrcmovie_core::pipeline::run_batch;
use tracing::info;

use super::estimate::estimate_rows;
use super::options::{CommonOptions, VideoOptions};
use crate::logging;
use crate::progress::BarReporter;
use crate::summary::{print_estimates, print_outcomes, print_run_summary};

#[derive(Args)]
pub struct RunArgs {
    /// MRC files or directories of volumes (.mrc, .st, .rec, .ali, .map)
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the videos, PNG folders and the process log
    #[arg(short, long)]
    pub output: PathBuf,

    /// Files converted concurrently [default: 1]
    #[arg(long = "batch-size", visible_alias = "batch_size")]
    pub batch_size: Option<usize>,

    /// Print the memory estimate for each file and exit without writing anything
    #[arg(long = "estimate-memory", visible_alias = "estimate_memory")]
    pub estimate_memory: bool,

    #[command(flatten)]
    pub common: CommonOptions,

    #[command(flatten)]
    pub video: VideoOptions,
}

pub fn run(args: &RunArgs, verbose: bool) -> Result<()> {
    let mut config = args.common.resolve()?;
    args.video.apply(&mut config);
    if let Some(n) = args.batch_size {
        config.batch_size = n;
    }
    config.validate()?;

    let inputs = discover_inputs(&args.inputs)?;

    if args.estimate_memory {
        logging::init(verbose, None)?;
        let rows = estimate_rows(&inputs, &config);
        print_estimates(&rows, config.memory.allow_over_budget);
        return Ok(());
    }

    logging::init(verbose, Some(&args.output))?;
    info!(files = inputs.len(), config = ?config, "Resolved conversion config");
    print_run_summary(&config, &inputs, &args.output);

    let reporter = BarReporter::new()?;
    let outcomes = run_batch(&inputs, &args.output, &config, &reporter);
    reporter.clear();
    let outcomes = outcomes?;

    print_outcomes(&outcomes);
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        bail!("{failed} of {} file(s) failed; see the log for details", outcomes.len());
    }
    Ok(())
}
