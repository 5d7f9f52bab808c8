use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use mrcmovie_core::pipeline::config::{
    Codec, ConversionConfig, DiscardPolicy, Playback, Preset, SpeedProfile,
};

/// Options shared by every command that renders frames.
///
/// Precedence, lowest first: built-in defaults, `--config` file, `--preset`,
/// then individual flags.
#[derive(Args, Debug)]
pub struct CommonOptions {
    /// Conversion config file (TOML); see `mrcmovie config`
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Parameter preset: tomogram (tomo), tiltseries (ts), quick, max_quality
    #[arg(long)]
    pub preset: Option<Preset>,

    /// CLAHE clip limit [default: 2.0; 30-1000 for low-SNR tilt series]
    #[arg(long = "clip-limit", visible_alias = "clip_limit")]
    pub clip_limit: Option<f32>,

    /// CLAHE tiles per axis [default: 8]
    #[arg(long = "tile-grid-size", visible_alias = "tile_grid_size")]
    pub tile_grid_size: Option<usize>,

    /// Scale the clip limit to the volume's dynamic range (always on for `png`)
    #[arg(long = "adaptive-clip", visible_alias = "adaptive_clip")]
    pub adaptive_clip: bool,

    /// Bound on the longer frame dimension in pixels [default: 1024]
    #[arg(long = "output-size", visible_alias = "output_size")]
    pub output_size: Option<usize>,

    /// Enlarge volumes smaller than the output size
    #[arg(long)]
    pub allow_upscale: bool,

    /// Keep only slices START..END (0-based, END exclusive)
    #[arg(
        long = "discard-range",
        visible_alias = "discard_range",
        num_args = 2,
        value_names = ["START", "END"]
    )]
    pub discard_range: Option<Vec<usize>>,

    /// Drop a fraction of the depth from the front and back (e.g. 0.1 0.1)
    #[arg(
        long = "discard-percentage",
        visible_alias = "discard_percentage",
        num_args = 2,
        value_names = ["START", "END"]
    )]
    pub discard_percentage: Option<Vec<f64>>,

    /// Speed vs quality trade-off: fast, balanced, quality
    #[arg(long)]
    pub speed: Option<SpeedProfile>,

    /// Worker threads per volume [default: all cores]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Memory budget, e.g. 512M or 16G [default: 80% of physical memory]
    #[arg(long = "memory-budget", value_parser = parse_size)]
    pub memory_budget: Option<u64>,

    /// Convert volumes even when their memory estimate exceeds the budget
    #[arg(long)]
    pub allow_over_budget: bool,
}

impl CommonOptions {
    /// Layer the config file, preset and flags into one configuration.
    pub fn resolve(&self) -> Result<ConversionConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Invalid conversion config {}", path.display()))?
            }
            None => ConversionConfig::default(),
        };

        if let Some(preset) = self.preset {
            config.output = preset.apply(config.output);
        }

        let out = &mut config.output;
        if let Some(v) = self.clip_limit {
            out.clip_limit = v;
        }
        if let Some(v) = self.tile_grid_size {
            out.tile_grid_size = v;
        }
        if self.adaptive_clip {
            out.adaptive_clip = true;
        }
        if let Some(v) = self.output_size {
            out.output_size = v;
        }
        if self.allow_upscale {
            out.allow_upscale = true;
        }
        if let Some(v) = self.speed {
            out.speed = v;
        }

        let range = self.discard_range.as_deref().map(|v| (v[0], v[1]));
        let percentage = self.discard_percentage.as_deref().map(|v| (v[0], v[1]));
        if range.is_some() || percentage.is_some() {
            config.discard = DiscardPolicy::from_options(range, percentage)?;
        }

        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.memory_budget.is_some() {
            config.memory.budget_bytes = self.memory_budget;
        }
        if self.allow_over_budget {
            config.memory.allow_over_budget = true;
        }
        Ok(config)
    }
}

/// Options that only matter when a video is written.
#[derive(Args, Debug)]
pub struct VideoOptions {
    /// Frame rate [default: 30; 1-8 reads better for tilt series]
    #[arg(long)]
    pub fps: Option<f64>,

    /// Video codec: MJPG or Y800 (raw)
    #[arg(long)]
    pub codec: Option<Codec>,

    /// Playback direction: forward, forward-backward
    #[arg(long)]
    pub playback: Option<Playback>,

    /// Also save the processed slices as PNG files
    #[arg(long)]
    pub png: bool,
}

impl VideoOptions {
    pub fn apply(&self, config: &mut ConversionConfig) {
        let out = &mut config.output;
        if let Some(v) = self.fps {
            out.fps = v;
        }
        if let Some(v) = self.codec {
            out.codec = v;
        }
        if let Some(v) = self.playback {
            out.playback = v;
        }
        if self.png {
            out.save_png = true;
        }
    }
}

/// Parse a byte count with an optional binary suffix (K, M, G, T).
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    let (digits, shift) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => {
            let shift = match c.to_ascii_uppercase() {
                'K' => 10,
                'M' => 20,
                'G' => 30,
                'T' => 40,
                'B' => 0,
                other => bail!("unknown size suffix '{other}'"),
            };
            (&s[..i], shift)
        }
        _ => (s, 0),
    };
    let value: f64 = digits
        .trim()
        .parse()
        .with_context(|| format!("invalid size '{s}'"))?;
    if !(value.is_finite() && value > 0.0) {
        bail!("size must be positive, got '{s}'");
    }
    Ok((value * (1u64 << shift) as f64) as u64)
}
