use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mrcmovie_core::pipeline::config::{ConversionConfig, Preset};

#[derive(Args)]
pub struct ConfigArgs {
    /// Start from a preset instead of the plain defaults
    #[arg(long)]
    pub preset: Option<Preset>,

    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default ConversionConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let mut config = ConversionConfig::default();
    if let Some(preset) = args.preset {
        config.output = preset.apply(config.output);
    }
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
