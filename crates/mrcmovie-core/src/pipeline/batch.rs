use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{MovieError, Result};
use crate::io::discover::check_output_names;

use super::config::ConversionConfig;
use super::orchestrator::{convert_volume, WorkerPool};
use super::types::{ConversionReport, FileFailure, ProgressReporter};

/// Result of converting one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: std::result::Result<ConversionReport, FileFailure>,
    /// Wall-clock time spent on this file.
    pub elapsed: Duration,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Convert every input into `out_dir`, at most `config.batch_size` at a time.
///
/// The configuration and the output names are checked up front; those and
/// starting the worker pool are the only failures that abort the run. Per-file failures are
/// reported in the returned outcomes, one per input, in input order.
pub fn run_batch(
    inputs: &[PathBuf],
    out_dir: &Path,
    config: &ConversionConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<FileOutcome>> {
    config.validate()?;
    if inputs.is_empty() {
        return Err(MovieError::Config("no input files".into()));
    }
    check_output_names(inputs)?;

    let pool = WorkerPool::new(config.workers)?;
    let lanes = config.batch_size.clamp(1, inputs.len());
    info!(
        files = inputs.len(),
        concurrent = lanes,
        workers = pool.threads(),
        out_dir = %out_dir.display(),
        "Starting batch"
    );

    let next = AtomicUsize::new(0);
    let (next, pool) = (&next, &pool);
    let mut outcomes: Vec<(usize, FileOutcome)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..lanes)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(input) = inputs.get(i) else {
                            break;
                        };
                        let started = Instant::now();
                        let result = convert_volume(input, out_dir, config, pool, reporter);
                        done.push((
                            i,
                            FileOutcome {
                                input: input.clone(),
                                result,
                                elapsed: started.elapsed(),
                            },
                        ));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });
    outcomes.sort_by_key(|(i, _)| *i);

    let failed = outcomes.iter().filter(|(_, o)| !o.is_success()).count();
    if failed > 0 {
        warn!(failed, total = inputs.len(), "Batch finished with failures");
    } else {
        info!(total = inputs.len(), "Batch finished");
    }
    Ok(outcomes.into_iter().map(|(_, o)| o).collect())
}
