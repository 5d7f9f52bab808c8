use std::path::{Path, PathBuf};

use console::Style;
use mrcmovie_core::frame::VolumeInfo;
use mrcmovie_core::memory::{format_bytes, MemoryStatus, MemoryVerdict};
use mrcmovie_core::pipeline::config::ConversionConfig;
use mrcmovie_core::pipeline::FileOutcome;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    ok: Style,
    warn: Style,
    fail: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red().bold(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }

    fn status(&self, status: MemoryStatus) -> &Style {
        match status {
            MemoryStatus::Ok => &self.ok,
            MemoryStatus::Warn => &self.warn,
            MemoryStatus::Reject => &self.fail,
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

/// Echo the resolved configuration before a batch starts.
pub fn print_run_summary(config: &ConversionConfig, inputs: &[PathBuf], out_dir: &Path) {
    let s = Styles::new();
    let out = &config.output;

    print_title(&s, "MRC Movie");

    let input_label = if inputs.len() == 1 {
        inputs[0].display().to_string()
    } else {
        format!("{} volumes", inputs.len())
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input_label)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(out_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Concurrency"),
        s.value.apply_to(format!(
            "{} file(s), {} worker(s)",
            config.batch_size,
            config
                .workers
                .map_or_else(|| "all".to_string(), |w| w.to_string())
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Slices"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Discard"),
        s.value.apply_to(&config.discard)
    );
    println!();

    println!("  {}", s.header.apply_to("Enhancement"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Clip limit"),
        s.value.apply_to(if out.adaptive_clip {
            format!("{} (adaptive)", out.clip_limit)
        } else {
            out.clip_limit.to_string()
        })
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tile grid"),
        s.value.apply_to(format!("{0}x{0}", out.tile_grid_size))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frame size"),
        s.value.apply_to(format!(
            "{} px{}",
            out.effective_output_size(),
            if out.allow_upscale { ", upscale" } else { "" }
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Speed"),
        s.value.apply_to(out.speed)
    );
    println!();

    if out.write_video {
        println!("  {}", s.header.apply_to("Video"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Codec"),
            s.value.apply_to(out.codec)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("FPS"),
            s.value.apply_to(out.fps)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Playback"),
            s.value.apply_to(out.playback)
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Video"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();

    if !out.save_png {
        println!(
            "  {:<14}{}",
            s.header.apply_to("PNG export"),
            s.disabled.apply_to("disabled")
        );
        println!();
    }
}

/// One line per file, then the totals.
pub fn print_outcomes(outcomes: &[FileOutcome]) {
    let s = Styles::new();
    print_title(&s, "Results");

    for outcome in outcomes {
        let name = outcome
            .input
            .file_name()
            .map_or_else(|| outcome.input.display().to_string(), |n| n.to_string_lossy().into_owned());
        let elapsed = format!("{:.1}s", outcome.elapsed.as_secs_f64());
        match outcome.result {
            Ok(ref report) => {
                let (h, w) = report.frame_dims;
                let mut written = Vec::new();
                if let Some(ref video) = report.video {
                    written.push(format!("{} ({} frames)", video.display(), report.frames_written));
                }
                if let Some(ref dir) = report.png_dir {
                    written.push(format!("{}/", dir.display()));
                }
                println!(
                    "  {} {:<28}{:>8}  {}  {}",
                    s.ok.apply_to("\u{2713}"),
                    s.value.apply_to(name),
                    s.label.apply_to(elapsed),
                    s.label.apply_to(format!("{w}x{h}, slices {}", report.range)),
                    s.path.apply_to(written.join(", "))
                );
            }
            Err(ref failure) => {
                println!(
                    "  {} {:<28}{:>8}  {}",
                    s.fail.apply_to("\u{2717}"),
                    s.value.apply_to(name),
                    s.label.apply_to(elapsed),
                    s.fail.apply_to(format!("[{}] {failure}", failure.error.kind()))
                );
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Converted"),
        s.value
            .apply_to(format!("{}/{}", outcomes.len() - failed, outcomes.len()))
    );
    if failed > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Failed"),
            s.fail.apply_to(failed)
        );
    }
    println!();
}

/// A dry-run row: the header and its verdict, or why it could not be read.
pub struct EstimateRow {
    pub input: PathBuf,
    pub estimate: Result<(VolumeInfo, MemoryVerdict), String>,
}

/// Memory-estimate report for a dry run.
pub fn print_estimates(rows: &[EstimateRow], allow_over_budget: bool) {
    let s = Styles::new();
    print_title(&s, "Memory Estimate");

    if let Some((_, verdict)) = rows.iter().find_map(|r| r.estimate.as_ref().ok()) {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Budget"),
            s.value.apply_to(format_bytes(verdict.available_bytes))
        );
        println!();
    }

    println!(
        "  {:<28}{:<18}{:<10}{:>12}{:>12}  {}",
        s.header.apply_to("File"),
        s.header.apply_to("Shape (ZxYxX)"),
        s.header.apply_to("Dtype"),
        s.header.apply_to("Raw"),
        s.header.apply_to("Estimated"),
        s.header.apply_to("Verdict")
    );
    for row in rows {
        let name = row
            .input
            .file_name()
            .map_or_else(|| row.input.display().to_string(), |n| n.to_string_lossy().into_owned());
        match row.estimate {
            Ok((ref info, ref verdict)) => {
                let verdict_text = if verdict.status == MemoryStatus::Reject && allow_over_budget {
                    format!("{} (override)", verdict.status)
                } else {
                    verdict.status.to_string()
                };
                println!(
                    "  {:<28}{:<18}{:<10}{:>12}{:>12}  {}",
                    s.value.apply_to(name),
                    format!("{}x{}x{}", info.depth, info.height, info.width),
                    info.mode.to_string(),
                    format_bytes(verdict.raw_bytes),
                    format_bytes(verdict.estimated_peak_bytes),
                    s.status(verdict.status).apply_to(verdict_text)
                );
            }
            Err(ref reason) => {
                println!(
                    "  {:<28}{}",
                    s.value.apply_to(name),
                    s.fail.apply_to(reason)
                );
            }
        }
    }
    println!();
}
