use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mrcmovie_core::io::discover_inputs;
use mrcmovie_core::pipeline::config::ConversionConfig;
use mrcmovie_core::pipeline::estimate_file;

use super::options::CommonOptions;
use crate::summary::{print_estimates, EstimateRow};

#[derive(Args)]
pub struct EstimateArgs {
    /// MRC files or directories of volumes
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonOptions,
}

/// Read only the headers and report the memory verdict for each file.
pub fn run(args: &EstimateArgs) -> Result<()> {
    let config = args.common.resolve()?;
    config.validate()?;
    let inputs = discover_inputs(&args.inputs)?;

    let rows = estimate_rows(&inputs, &config);
    print_estimates(&rows, config.memory.allow_over_budget);
    Ok(())
}

pub(crate) fn estimate_rows(inputs: &[PathBuf], config: &ConversionConfig) -> Vec<EstimateRow> {
    inputs
        .iter()
        .map(|input| EstimateRow {
            input: input.clone(),
            estimate: estimate_file(input, config).map_err(|e| e.to_string()),
        })
        .collect()
}
