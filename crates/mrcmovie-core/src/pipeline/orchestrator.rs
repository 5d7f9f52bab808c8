use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{error, info};

use crate::assemble::FrameSequence;
use crate::enhance::ContrastEnhancer;
use crate::error::{MovieError, Result};
use crate::frame::{Frame, VolumeInfo};
use crate::io::avi::AviWriter;
use crate::io::discover::output_basename;
use crate::io::image_io::write_png_sequence;
use crate::io::mrc::MrcReader;
use crate::memory::{estimate_memory, format_bytes, MemoryVerdict};
use crate::range::SliceRange;
use crate::stats::{compute_global_stats, GlobalStats};

use super::config::{ConversionConfig, OutputSpec};
use super::types::{
    ConversionReport, FileFailure, NoOpReporter, PipelineStage, ProgressReporter,
};

/// Bounded pool of worker threads for per-slice enhancement.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// `None` sizes the pool to the number of cores.
    pub fn new(workers: Option<usize>) -> Result<Self> {
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|i| format!("mrcmovie-worker-{i}"));
        if let Some(n) = workers {
            if n == 0 {
                return Err(MovieError::Config("worker count must be at least 1".into()));
            }
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| MovieError::Config(format!("cannot start worker pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool; parallel iterators in `op` use its threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

/// Tracks the current stage of one conversion for progress and failure context.
struct Run<'a> {
    input: &'a Path,
    reporter: &'a dyn ProgressReporter,
    stage: PipelineStage,
    shape: Option<(usize, usize, usize)>,
}

impl<'a> Run<'a> {
    fn new(input: &'a Path, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            input,
            reporter,
            stage: PipelineStage::OpeningVolume,
            shape: None,
        }
    }

    fn stage<T>(
        &mut self,
        stage: PipelineStage,
        total_items: Option<usize>,
        op: impl FnOnce(&Self) -> Result<T>,
    ) -> Result<T> {
        self.stage = stage;
        self.reporter.begin_stage(self.input, stage, total_items);
        let out = op(self);
        self.reporter.finish_stage(self.input);
        out
    }

    fn advance(&self, items_done: usize) {
        self.reporter.advance(self.input, items_done);
    }

    fn fail(&self, error: MovieError) -> FileFailure {
        error!(
            path = %self.input.display(),
            stage = %self.stage,
            shape = ?self.shape,
            kind = %error.kind(),
            error = %error,
            "Conversion failed"
        );
        FileFailure {
            stage: self.stage,
            shape: self.shape,
            error,
        }
    }
}

/// Predict peak memory for `info` under `config`, without touching the data.
pub fn estimate_volume(info: &VolumeInfo, config: &ConversionConfig) -> MemoryVerdict {
    estimate_memory(
        (info.depth, info.height, info.width),
        info.mode.itemsize(),
        config.output.effective_output_size(),
        config.memory.expansion_factor,
        config.memory.available_bytes(),
    )
}

/// Read the header of `path` and estimate its memory needs. Writes nothing.
pub fn estimate_file(
    path: &Path,
    config: &ConversionConfig,
) -> Result<(VolumeInfo, MemoryVerdict)> {
    let reader = MrcReader::open(path)?;
    let info = reader.volume_info();
    let verdict = estimate_volume(&info, config);
    Ok((info, verdict))
}

/// Convert one volume into its video and/or PNG sequence inside `out_dir`.
///
/// Two passes over the selected slices: a sequential statistics pass, then
/// parallel enhancement on `pool`. Any failure ends this file only; the
/// returned [`FileFailure`] records the stage it happened in.
pub fn convert_volume(
    input: &Path,
    out_dir: &Path,
    config: &ConversionConfig,
    pool: &WorkerPool,
    reporter: &dyn ProgressReporter,
) -> std::result::Result<ConversionReport, FileFailure> {
    let mut run = Run::new(input, reporter);
    match convert_inner(&mut run, out_dir, config, pool) {
        Ok(report) => {
            info!(
                path = %input.display(),
                frames = report.frames_written,
                video = ?report.video,
                png_dir = ?report.png_dir,
                "Conversion finished"
            );
            Ok(report)
        }
        Err(e) => Err(run.fail(e)),
    }
}

/// Produce the frame sequence of one volume without writing anything.
pub fn render_frames(
    input: &Path,
    config: &ConversionConfig,
    pool: &WorkerPool,
) -> Result<FrameSequence> {
    let reporter = NoOpReporter;
    let mut run = Run::new(input, &reporter);
    let reader = open_and_admit(&mut run, config)?.0;
    let (_, _, sequence) = render(&mut run, &reader, config, pool)?;
    Ok(sequence)
}

fn open_and_admit(
    run: &mut Run<'_>,
    config: &ConversionConfig,
) -> Result<(MrcReader, MemoryVerdict)> {
    let input = run.input;
    let reader = run.stage(PipelineStage::OpeningVolume, None, |_| MrcReader::open(input))?;
    run.shape = Some((reader.depth(), reader.height(), reader.width()));

    let verdict = run.stage(PipelineStage::MemoryCheck, None, |_| {
        let verdict = estimate_volume(&reader.volume_info(), config);
        info!(
            path = %input.display(),
            raw = %format_bytes(verdict.raw_bytes),
            estimated = %format_bytes(verdict.estimated_peak_bytes),
            available = %format_bytes(verdict.available_bytes),
            status = %verdict.status,
            "Memory verdict"
        );
        config.memory.admit(&verdict)?;
        Ok(verdict)
    })?;
    Ok((reader, verdict))
}

fn render(
    run: &mut Run<'_>,
    reader: &MrcReader,
    config: &ConversionConfig,
    pool: &WorkerPool,
) -> Result<(SliceRange, GlobalStats, FrameSequence)> {
    let range = run.stage(PipelineStage::SliceSelection, None, |_| {
        config.discard.resolve(reader.depth())
    })?;
    info!(
        %range,
        retained = range.len(),
        depth = reader.depth(),
        policy = %config.discard,
        "Selected slices"
    );

    // Pass 1: sequential barrier, every enhancement task sees the same bounds.
    let stats = run.stage(PipelineStage::GlobalStats, Some(range.len()), |run| {
        compute_global_stats(reader.slices(range.indices()), |n| run.advance(n))
    })?;
    if stats.is_degenerate() {
        info!(value = stats.min, "Volume is constant; frames will be blank");
    }

    let mut params = config.output.enhance_params();
    if config.output.adaptive_clip {
        params = params.adapted_to(&stats);
        info!(
            range = stats.range(),
            requested = config.output.clip_limit,
            clip_limit = params.clip_limit,
            "Adapted clip limit to dynamic range"
        );
    }

    // Pass 2: independent per-slice tasks, re-joined by index.
    let enhancer = ContrastEnhancer::new(stats, params, (reader.height(), reader.width()));
    let assembler = config.output.assembler();
    let done = AtomicUsize::new(0);
    let frames = run.stage(PipelineStage::Enhancing, Some(range.len()), |run| {
        pool.install(|| {
            range
                .indices()
                .into_par_iter()
                .map(|index| {
                    let slice = reader.slice_at(index)?;
                    let frame = assembler.fit(enhancer.enhance(&slice, index)?);
                    run.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
                    Ok(frame)
                })
                .collect::<Result<Vec<Frame>>>()
        })
    })?;

    let sequence = assembler.assemble(frames)?;
    Ok((range, stats, sequence))
}

fn convert_inner(
    run: &mut Run<'_>,
    out_dir: &Path,
    config: &ConversionConfig,
    pool: &WorkerPool,
) -> Result<ConversionReport> {
    let (reader, verdict) = open_and_admit(run, config)?;
    let (range, stats, sequence) = render(run, &reader, config, pool)?;
    let info = reader.volume_info();
    drop(reader);

    fs::create_dir_all(out_dir)
        .map_err(|e| MovieError::Output(format!("cannot create {}: {e}", out_dir.display())))?;
    let basename = output_basename(run.input);
    let spec = &config.output;

    let video = if spec.write_video {
        let path = out_dir.join(format!("{basename}.avi"));
        run.stage(PipelineStage::Encoding, Some(sequence.len()), |run| {
            write_video(&sequence, &path, spec, |n| run.advance(n))
        })?;
        Some(path)
    } else {
        None
    };

    let png_dir = if spec.save_png {
        let dir = run.stage(
            PipelineStage::WritingPngs,
            Some(sequence.forward().len()),
            |_| {
                write_png_sequence(
                    sequence.forward(),
                    out_dir,
                    &basename,
                    spec.speed.png_compression(),
                )
            },
        )?;
        Some(dir)
    } else {
        None
    };

    Ok(ConversionReport {
        input: run.input.to_path_buf(),
        info,
        verdict,
        range,
        stats,
        video,
        png_dir,
        frames_written: if spec.write_video { sequence.len() } else { 0 },
        frame_dims: sequence.frame_dims(),
    })
}

/// Encode `sequence` in playback order to an AVI at `path`.
pub fn write_video(
    sequence: &FrameSequence,
    path: &Path,
    spec: &OutputSpec,
    on_frame: impl Fn(usize),
) -> Result<()> {
    let mut writer = AviWriter::create(
        path,
        spec.codec,
        sequence.frame_dims(),
        spec.fps,
        spec.speed.jpeg_quality(),
    )?;
    for (i, frame) in sequence.iter().enumerate() {
        writer.write_frame(frame)?;
        on_frame(i + 1);
    }
    writer.finish()?;
    info!(
        path = %path.display(),
        frames = sequence.len(),
        codec = %spec.codec,
        fps = spec.fps,
        "Wrote video"
    );
    Ok(())
}
