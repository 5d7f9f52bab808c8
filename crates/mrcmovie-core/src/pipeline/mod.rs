pub mod batch;
pub mod config;
mod orchestrator;
mod types;

pub use batch::{run_batch, FileOutcome};
pub use orchestrator::{
    convert_volume, estimate_file, estimate_volume, render_frames, write_video, WorkerPool,
};
pub use types::{ConversionReport, FileFailure, NoOpReporter, PipelineStage, ProgressReporter};
