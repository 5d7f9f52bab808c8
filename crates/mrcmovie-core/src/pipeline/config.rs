use std::fmt;
use std::str::FromStr;

use image::codecs::png::CompressionType;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CLIP_LIMIT, DEFAULT_FPS, DEFAULT_OUTPUT_SIZE, DEFAULT_TILE_GRID_SIZE,
    FAST_OUTPUT_SIZE_CAP,
};
use crate::enhance::EnhanceParams;
use crate::error::{MovieError, Result};

pub use crate::assemble::Playback;
use crate::assemble::FrameAssembler;
pub use crate::io::avi::Codec;
pub use crate::memory::MemoryPolicy;
pub use crate::range::DiscardPolicy;

/// Trade-off between encoding time and output quality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedProfile {
    Fast,
    #[default]
    Balanced,
    Quality,
}

impl SpeedProfile {
    pub fn jpeg_quality(self) -> u8 {
        match self {
            Self::Fast => 75,
            Self::Balanced => 85,
            Self::Quality => 95,
        }
    }

    pub fn png_compression(self) -> CompressionType {
        match self {
            Self::Fast => CompressionType::Fast,
            Self::Balanced => CompressionType::Default,
            Self::Quality => CompressionType::Best,
        }
    }
}

impl fmt::Display for SpeedProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Balanced => write!(f, "balanced"),
            Self::Quality => write!(f, "quality"),
        }
    }
}

impl FromStr for SpeedProfile {
    type Err = MovieError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "quality" => Ok(Self::Quality),
            other => Err(MovieError::Config(format!("unknown speed profile '{other}'"))),
        }
    }
}

/// How frames are rendered and encoded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    pub fps: f64,
    pub clip_limit: f32,
    pub tile_grid_size: usize,
    pub codec: Codec,
    pub playback: Playback,
    /// Bound on the longer frame dimension, in pixels.
    pub output_size: usize,
    pub allow_upscale: bool,
    /// Encode the playback sequence to `{basename}.avi`.
    pub write_video: bool,
    /// Also export the forward sequence as PNG files.
    pub save_png: bool,
    /// Rescale `clip_limit` to the volume's dynamic range after the
    /// statistics pass.
    pub adaptive_clip: bool,
    pub speed: SpeedProfile,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            clip_limit: DEFAULT_CLIP_LIMIT,
            tile_grid_size: DEFAULT_TILE_GRID_SIZE,
            codec: Codec::default(),
            playback: Playback::default(),
            output_size: DEFAULT_OUTPUT_SIZE,
            allow_upscale: false,
            write_video: true,
            save_png: false,
            adaptive_clip: false,
            speed: SpeedProfile::default(),
        }
    }
}

impl OutputSpec {
    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(MovieError::Config(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }
        if !self.clip_limit.is_finite() {
            return Err(MovieError::Config(format!(
                "clip limit must be finite, got {}",
                self.clip_limit
            )));
        }
        if self.tile_grid_size == 0 {
            return Err(MovieError::Config("tile grid size must be at least 1".into()));
        }
        if self.output_size == 0 {
            return Err(MovieError::Config("output size must be at least 1".into()));
        }
        if !self.write_video && !self.save_png {
            return Err(MovieError::Config(
                "nothing to write: video and PNG output are both disabled".into(),
            ));
        }
        Ok(())
    }

    /// `output_size` after the speed profile's cap.
    pub fn effective_output_size(&self) -> usize {
        match self.speed {
            SpeedProfile::Fast => self.output_size.min(FAST_OUTPUT_SIZE_CAP),
            _ => self.output_size,
        }
    }

    pub fn enhance_params(&self) -> EnhanceParams {
        EnhanceParams {
            clip_limit: self.clip_limit,
            tile_grid_size: self.tile_grid_size,
        }
    }

    pub fn assembler(&self) -> FrameAssembler {
        FrameAssembler {
            output_size: self.effective_output_size(),
            allow_upscale: self.allow_upscale,
            playback: self.playback,
        }
    }
}

/// Named starting points for common kinds of data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Reconstructed tomograms.
    Tomogram,
    /// Raw, low-SNR tilt series: slow and strongly equalized.
    TiltSeries,
    /// Small, fast previews.
    Quick,
    MaxQuality,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Tomogram,
        Preset::TiltSeries,
        Preset::Quick,
        Preset::MaxQuality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Tomogram => "tomogram",
            Self::TiltSeries => "tiltseries",
            Self::Quick => "quick",
            Self::MaxQuality => "max_quality",
        }
    }

    /// Look up a preset by name or alias (`tomo`, `ts`).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "tomogram" | "tomo" => Ok(Self::Tomogram),
            "tiltseries" | "ts" => Ok(Self::TiltSeries),
            "quick" => Ok(Self::Quick),
            "max_quality" => Ok(Self::MaxQuality),
            other => Err(MovieError::Config(format!(
                "unknown preset '{other}' (available: tomogram, tiltseries, quick, max_quality)"
            ))),
        }
    }

    /// (fps, clip limit, output size)
    fn values(self) -> (f64, f32, usize) {
        match self {
            Self::Tomogram => (30.0, 2.0, 1024),
            Self::TiltSeries => (8.0, 100.0, 1024),
            Self::Quick => (15.0, 2.0, 512),
            Self::MaxQuality => (30.0, 5.0, 2048),
        }
    }

    /// Return `spec` with this preset's values in place.
    pub fn apply(self, spec: OutputSpec) -> OutputSpec {
        let (fps, clip_limit, output_size) = self.values();
        OutputSpec {
            fps,
            clip_limit,
            output_size,
            ..spec
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = MovieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Everything one run needs, resolved once before any file is touched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub output: OutputSpec,
    pub discard: DiscardPolicy,
    pub memory: MemoryPolicy,
    /// Worker threads per volume; `None` uses every core.
    pub workers: Option<usize>,
    /// Volumes converted at the same time.
    pub batch_size: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output: OutputSpec::default(),
            discard: DiscardPolicy::default(),
            memory: MemoryPolicy::default(),
            workers: None,
            batch_size: 1,
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.discard.validate()?;
        self.memory.validate()?;
        if self.workers == Some(0) {
            return Err(MovieError::Config("worker count must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(MovieError::Config("batch size must be at least 1".into()));
        }
        Ok(())
    }
}
