use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::consts::PNG_DIR_SUFFIX;
use crate::error::{MovieError, Result};
use crate::frame::Frame;

/// Save a frame as 8-bit grayscale PNG.
pub fn save_png(frame: &Frame, path: &Path, compression: CompressionType) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| MovieError::Output(format!("cannot create {}: {e}", path.display())))?;
    let encoder = PngEncoder::new_with_quality(BufWriter::new(file), compression, FilterType::Adaptive);
    encoder.write_image(
        &frame.to_bytes(),
        frame.width() as u32,
        frame.height() as u32,
        ExtendedColorType::L8,
    )?;
    Ok(())
}

/// Directory the PNG sequence of `basename` goes into: `{out_dir}/{basename}_slices`.
pub fn png_sequence_dir(out_dir: &Path, basename: &str) -> PathBuf {
    out_dir.join(format!("{basename}{PNG_DIR_SUFFIX}"))
}

/// Write one PNG per frame, named `{basename}_{NNNN}.png` by position in
/// `frames`. Returns the directory the files were written to.
pub fn write_png_sequence(
    frames: &[Frame],
    out_dir: &Path,
    basename: &str,
    compression: CompressionType,
) -> Result<PathBuf> {
    let dir = png_sequence_dir(out_dir, basename);
    fs::create_dir_all(&dir)
        .map_err(|e| MovieError::Output(format!("cannot create {}: {e}", dir.display())))?;

    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("{basename}_{i:04}.png"));
        save_png(frame, &path, compression)?;
    }
    debug!(count = frames.len(), dir = %dir.display(), "Wrote PNG sequence");
    Ok(dir)
}
