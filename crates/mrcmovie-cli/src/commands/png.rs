use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use mrcmovie_core::pipeline::run_batch;

use super::options::CommonOptions;
use crate::logging;
use crate::progress::BarReporter;
use crate::summary::{print_outcomes, print_run_summary};

#[derive(Args)]
pub struct PngArgs {
    /// Input MRC file
    pub file: PathBuf,

    /// Directory for the slice folder and the process log
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub common: CommonOptions,
}

/// Export the enhanced slices of one volume as numbered PNG files.
pub fn run(args: &PngArgs, verbose: bool) -> Result<()> {
    let mut config = args.common.resolve()?;
    config.output.write_video = false;
    config.output.save_png = true;
    config.output.adaptive_clip = true;
    config.validate()?;

    logging::init(verbose, Some(&args.output))?;
    let inputs = [args.file.clone()];
    print_run_summary(&config, &inputs, &args.output);

    let reporter = BarReporter::new()?;
    let outcomes = run_batch(&inputs, &args.output, &config, &reporter);
    reporter.clear();
    let outcomes = outcomes?;

    print_outcomes(&outcomes);
    if outcomes.iter().any(|o| !o.is_success()) {
        bail!("Failed to export {}", args.file.display());
    }
    Ok(())
}
