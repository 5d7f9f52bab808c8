mod commands;
mod logging;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mrcmovie", about = "Turn cryo-ET MRC volumes into contrast-enhanced movies")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert volumes into AVI movies (and optionally PNG slices)
    #[command(visible_alias = "convert")]
    Run(commands::run::RunArgs),
    /// Export the enhanced slices of one volume as PNG files
    Png(commands::png::PngArgs),
    /// Show MRC header metadata
    Info(commands::info::InfoArgs),
    /// Report estimated memory use without converting anything
    Estimate(commands::estimate::EstimateArgs),
    /// Print a default conversion config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Png(args) => commands::png::run(args, cli.verbose),
        Commands::Info(args) => {
            logging::init(cli.verbose, None)?;
            commands::info::run(args)
        }
        Commands::Estimate(args) => {
            logging::init(cli.verbose, None)?;
            commands::estimate::run(args)
        }
        Commands::Config(args) => commands::config::run(args),
    }
}
