use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mrcmovie_core::io::discover::output_basename;
use mrcmovie_core::pipeline::{PipelineStage, ProgressReporter};

/// One progress bar per input file, stacked while files convert concurrently.
pub struct BarReporter {
    multi: MultiProgress,
    counted: ProgressStyle,
    spinner: ProgressStyle,
    bars: Mutex<HashMap<PathBuf, ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            multi: MultiProgress::new(),
            counted: ProgressStyle::default_bar()
                .template("{prefix:>16} {msg:28} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
            spinner: ProgressStyle::default_spinner().template("{prefix:>16} {msg:28} {spinner}")?,
            bars: Mutex::new(HashMap::new()),
        })
    }

    fn with_bar(&self, input: &Path, f: impl FnOnce(&ProgressBar)) {
        let mut bars = match self.bars.lock() {
            Ok(bars) => bars,
            Err(poisoned) => poisoned.into_inner(),
        };
        let bar = bars.entry(input.to_path_buf()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(0));
            bar.set_prefix(output_basename(input));
            bar
        });
        f(bar);
    }

    /// Remove every bar so the summary prints on a clean terminal.
    pub fn clear(&self) {
        let bars = match self.bars.lock() {
            Ok(bars) => bars,
            Err(poisoned) => poisoned.into_inner(),
        };
        for bar in bars.values() {
            bar.finish_and_clear();
        }
        let _ = self.multi.clear();
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, input: &Path, stage: PipelineStage, total_items: Option<usize>) {
        self.with_bar(input, |bar| {
            match total_items {
                Some(total) => {
                    bar.set_style(self.counted.clone());
                    bar.set_length(total as u64);
                }
                None => bar.set_style(self.spinner.clone()),
            }
            bar.set_position(0);
            bar.set_message(stage.to_string());
            bar.tick();
        });
    }

    fn advance(&self, input: &Path, items_done: usize) {
        self.with_bar(input, |bar| bar.set_position(items_done as u64));
    }

    fn finish_stage(&self, input: &Path) {
        self.with_bar(input, |bar| {
            if let Some(len) = bar.length() {
                bar.set_position(len);
            }
        });
    }
}
