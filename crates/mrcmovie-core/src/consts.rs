/// Size of the fixed MRC2014 main header in bytes.
pub const MRC_HEADER_SIZE: usize = 1024;

/// Default frame rate. Good for reconstructed tomograms; tilt series read
/// better at 1-8 fps.
pub const DEFAULT_FPS: f64 = 30.0;

/// Default CLAHE clip limit. Low-SNR tilt series need 30-1000.
pub const DEFAULT_CLIP_LIMIT: f32 = 2.0;

/// Default CLAHE tile grid (tiles per axis).
pub const DEFAULT_TILE_GRID_SIZE: usize = 8;

/// Default bound on the longer output dimension, in pixels.
pub const DEFAULT_OUTPUT_SIZE: usize = 1024;

/// Longer-dimension cap applied by the `fast` speed profile.
pub const FAST_OUTPUT_SIZE_CAP: usize = 512;

/// Dynamic-range band edges for the adaptive clip limit. Below the first:
/// reconstructed tomograms; above the second: raw tilt series.
pub const ADAPTIVE_CLIP_LOW_RANGE: f32 = 1_000.0;
pub const ADAPTIVE_CLIP_HIGH_RANGE: f32 = 10_000.0;

/// Number of 8-bit histogram bins used by CLAHE.
pub const HISTOGRAM_BINS: usize = 256;

/// Peak working memory as a multiple of the raw volume size
/// (f32 working copy + normalization buffer + CLAHE state).
pub const DEFAULT_MEMORY_EXPANSION_FACTOR: f64 = 2.5;

/// Fraction of physical memory the pipeline may plan to use.
pub const DEFAULT_MEMORY_BUDGET_FRACTION: f64 = 0.8;

/// An estimate above this fraction of the budget is reported as a warning.
pub const MEMORY_WARN_RATIO: f64 = 0.75;

/// Physical memory assumed when the platform does not report it. 8 GiB.
pub const FALLBACK_PHYSICAL_MEMORY_BYTES: u64 = 8 * 1024 * 1024 * 1024;

/// Suffix of the per-volume PNG export directory.
pub const PNG_DIR_SUFFIX: &str = "_slices";

/// Name of the per-run process log written into the output directory.
pub const LOG_FILE_NAME: &str = "mrcmovie.log";

/// File extensions (lowercase) picked up when a directory is given as input.
pub const VOLUME_EXTENSIONS: [&str; 5] = ["mrc", "st", "rec", "ali", "map"];
