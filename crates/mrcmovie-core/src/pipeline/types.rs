use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::MovieError;
use crate::frame::VolumeInfo;
use crate::memory::MemoryVerdict;
use crate::range::SliceRange;
use crate::stats::GlobalStats;

/// Conversion stage, used for progress reporting and error context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    OpeningVolume,
    MemoryCheck,
    SliceSelection,
    GlobalStats,
    Enhancing,
    Encoding,
    WritingPngs,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpeningVolume => write!(f, "Opening volume"),
            Self::MemoryCheck => write!(f, "Checking memory"),
            Self::SliceSelection => write!(f, "Selecting slices"),
            Self::GlobalStats => write!(f, "Computing global statistics"),
            Self::Enhancing => write!(f, "Enhancing slices"),
            Self::Encoding => write!(f, "Encoding video"),
            Self::WritingPngs => write!(f, "Writing PNGs"),
        }
    }
}

/// What one successful conversion produced.
#[derive(Clone, Debug)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub info: VolumeInfo,
    pub verdict: MemoryVerdict,
    pub range: SliceRange,
    pub stats: GlobalStats,
    /// `None` when only PNGs were requested.
    pub video: Option<PathBuf>,
    pub png_dir: Option<PathBuf>,
    /// Frames in the video, in playback order.
    pub frames_written: usize,
    pub frame_dims: (usize, usize),
}

/// A failed conversion: the error plus where it happened.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct FileFailure {
    pub stage: PipelineStage,
    /// (depth, height, width), once the header was read.
    pub shape: Option<(usize, usize, usize)>,
    #[source]
    pub error: MovieError,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A stage of the conversion of `input` has started. `total_items` is
    /// the number of work items in this stage, if known.
    fn begin_stage(&self, _input: &Path, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _input: &Path, _items_done: usize) {}

    /// The current stage of `input` is finished.
    fn finish_stage(&self, _input: &Path) {}
}

/// Progress reporter that ignores everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
