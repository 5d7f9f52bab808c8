use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

use byteorder::{LittleEndian, WriteBytesExt};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use serde::{Deserialize, Serialize};

use crate::error::{MovieError, Result};
use crate::frame::Frame;

/// AVIF_HASINDEX
const AVIF_HASINDEX: u32 = 0x10;
/// AVIIF_KEYFRAME
const AVIIF_KEYFRAME: u32 = 0x10;
/// Denominator of the stream rate; fps is stored as `rate / RATE_SCALE`.
const RATE_SCALE: u32 = 1000;
/// RIFF sizes are 32-bit: the whole file, minus the 8-byte `RIFF` header,
/// must fit in a `u32`.
const MAX_RIFF_SIZE: u64 = u32::MAX as u64;

/// Video stream encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    /// Motion JPEG: every frame is an independent grayscale JPEG.
    #[default]
    Mjpg,
    /// Uncompressed 8-bit luma (`Y800`).
    Raw,
}

impl Codec {
    pub fn fourcc(self) -> &'static [u8; 4] {
        match self {
            Self::Mjpg => b"MJPG",
            Self::Raw => b"Y800",
        }
    }

    fn bit_count(self) -> u16 {
        match self {
            Self::Mjpg => 24,
            Self::Raw => 8,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.fourcc()))
    }
}

impl FromStr for Codec {
    type Err = MovieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mjpg" | "mjpeg" => Ok(Self::Mjpg),
            "y800" | "raw" => Ok(Self::Raw),
            _ => Err(MovieError::Output(format!(
                "unsupported codec '{s}' (supported: MJPG, Y800)"
            ))),
        }
    }
}

struct IndexEntry {
    offset: u32,
    size: u32,
}

/// Byte positions of header fields that are only known once all frames are in.
struct Patches {
    riff_size: u64,
    total_frames: u64,
    stream_length: u64,
    movi_size: u64,
    movi_fourcc: u64,
}

/// Streams grayscale frames into an AVI 1.0 (RIFF) file with one video stream.
///
/// Frame count and chunk sizes are patched in by [`AviWriter::finish`]; a
/// writer dropped without `finish` leaves an unplayable file.
pub struct AviWriter {
    writer: BufWriter<File>,
    codec: Codec,
    width: usize,
    height: usize,
    jpeg_quality: u8,
    index: Vec<IndexEntry>,
    patches: Patches,
    size_limit: u64,
}

impl AviWriter {
    /// Create the file and write the stream headers.
    pub fn create(
        path: &Path,
        codec: Codec,
        (height, width): (usize, usize),
        fps: f64,
        jpeg_quality: u8,
    ) -> Result<Self> {
        if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(MovieError::Output(format!(
                "invalid video dimensions {width}x{height}"
            )));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(MovieError::Output(format!("invalid frame rate {fps}")));
        }
        let file = File::create(path).map_err(|e| {
            MovieError::Output(format!("cannot create {}: {e}", path.display()))
        })?;
        let mut writer = BufWriter::new(file);
        let patches = write_headers(&mut writer, codec, width, height, fps)?;
        Ok(Self {
            writer,
            codec,
            width,
            height,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            index: Vec::new(),
            patches,
            size_limit: MAX_RIFF_SIZE,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.index.len()
    }

    /// Append one frame. Every frame must match the size given to `create`.
    ///
    /// Fails without writing anything if the frame would push the finished
    /// file (index included) past the AVI 1.0 size limit.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if (frame.height(), frame.width()) != (self.height, self.width) {
            return Err(MovieError::Output(format!(
                "frame {} is {}x{}, video is {}x{}",
                frame.slice_index,
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }

        let pixels = frame.to_bytes();
        let payload = match self.codec {
            Codec::Raw => pixels,
            Codec::Mjpg => {
                let mut buf = Vec::new();
                JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality).encode(
                    &pixels,
                    self.width as u32,
                    self.height as u32,
                    ExtendedColorType::L8,
                )?;
                buf
            }
        };

        let chunk_start = self.writer.stream_position()?;
        let padded = payload.len() as u64 + payload.len() as u64 % 2;
        let idx1_bytes = 8 + 16 * (self.index.len() as u64 + 1);
        let riff_size = chunk_start + 8 + padded + idx1_bytes - 8;
        if riff_size > self.size_limit {
            return Err(MovieError::Output(format!(
                "AVI 1.0 size limit exceeded at frame {} ({} frames written)",
                frame.slice_index,
                self.index.len()
            )));
        }
        self.writer.write_all(b"00dc")?;
        self.writer.write_u32::<LittleEndian>(payload.len() as u32)?;
        self.writer.write_all(&payload)?;
        if payload.len() % 2 == 1 {
            self.writer.write_u8(0)?;
        }

        self.index.push(IndexEntry {
            offset: (chunk_start - self.patches.movi_fourcc) as u32,
            size: payload.len() as u32,
        });
        Ok(())
    }

    /// Write the index, patch sizes and frame counts, and flush.
    pub fn finish(mut self) -> Result<()> {
        let movi_end = self.writer.stream_position()?;

        self.writer.write_all(b"idx1")?;
        self.writer
            .write_u32::<LittleEndian>((self.index.len() * 16) as u32)?;
        for entry in &self.index {
            self.writer.write_all(b"00dc")?;
            self.writer.write_u32::<LittleEndian>(AVIIF_KEYFRAME)?;
            self.writer.write_u32::<LittleEndian>(entry.offset)?;
            self.writer.write_u32::<LittleEndian>(entry.size)?;
        }
        let file_end = self.writer.stream_position()?;

        let frames = self.index.len() as u32;
        let p = &self.patches;
        let fields = [
            (p.riff_size, (file_end - 8) as u32),
            (p.total_frames, frames),
            (p.stream_length, frames),
            (p.movi_size, (movi_end - p.movi_fourcc) as u32),
        ];
        for (pos, value) in fields {
            self.writer.seek(SeekFrom::Start(pos))?;
            self.writer.write_u32::<LittleEndian>(value)?;
        }
        self.writer.seek(SeekFrom::Start(file_end))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
impl AviWriter {
    fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }
}

fn write_headers(
    w: &mut BufWriter<File>,
    codec: Codec,
    width: usize,
    height: usize,
    fps: f64,
) -> Result<Patches> {
    let frame_bytes = (width * height * codec.bit_count() as usize / 8) as u32;
    let micros_per_frame = (1_000_000.0 / fps).round() as u32;
    let rate = (fps * RATE_SCALE as f64).round().max(1.0) as u32;

    // RIFF 'AVI '
    w.write_all(b"RIFF")?;
    let riff_size = w.stream_position()?;
    w.write_u32::<LittleEndian>(0)?;
    w.write_all(b"AVI ")?;

    // LIST 'hdrl': avih (8 + 56) + LIST 'strl' (12 + strh 64 + strf 48)
    w.write_all(b"LIST")?;
    w.write_u32::<LittleEndian>(4 + 64 + 12 + 64 + 48)?;
    w.write_all(b"hdrl")?;

    // Main AVI header
    w.write_all(b"avih")?;
    w.write_u32::<LittleEndian>(56)?;
    w.write_u32::<LittleEndian>(micros_per_frame)?;
    w.write_u32::<LittleEndian>(0)?; // max bytes per second
    w.write_u32::<LittleEndian>(0)?; // padding granularity
    w.write_u32::<LittleEndian>(AVIF_HASINDEX)?;
    let total_frames = w.stream_position()?;
    w.write_u32::<LittleEndian>(0)?;
    w.write_u32::<LittleEndian>(0)?; // initial frames
    w.write_u32::<LittleEndian>(1)?; // streams
    w.write_u32::<LittleEndian>(frame_bytes)?; // suggested buffer size
    w.write_u32::<LittleEndian>(width as u32)?;
    w.write_u32::<LittleEndian>(height as u32)?;
    for _ in 0..4 {
        w.write_u32::<LittleEndian>(0)?; // reserved
    }

    // LIST 'strl'
    w.write_all(b"LIST")?;
    w.write_u32::<LittleEndian>(4 + 64 + 48)?;
    w.write_all(b"strl")?;

    // Stream header
    w.write_all(b"strh")?;
    w.write_u32::<LittleEndian>(56)?;
    w.write_all(b"vids")?;
    w.write_all(codec.fourcc())?;
    w.write_u32::<LittleEndian>(0)?; // flags
    w.write_u16::<LittleEndian>(0)?; // priority
    w.write_u16::<LittleEndian>(0)?; // language
    w.write_u32::<LittleEndian>(0)?; // initial frames
    w.write_u32::<LittleEndian>(RATE_SCALE)?;
    w.write_u32::<LittleEndian>(rate)?;
    w.write_u32::<LittleEndian>(0)?; // start
    let stream_length = w.stream_position()?;
    w.write_u32::<LittleEndian>(0)?;
    w.write_u32::<LittleEndian>(frame_bytes)?; // suggested buffer size
    w.write_u32::<LittleEndian>(u32::MAX)?; // quality: driver default
    w.write_u32::<LittleEndian>(0)?; // sample size
    w.write_i16::<LittleEndian>(0)?;
    w.write_i16::<LittleEndian>(0)?;
    w.write_i16::<LittleEndian>(width.min(i16::MAX as usize) as i16)?;
    w.write_i16::<LittleEndian>(height.min(i16::MAX as usize) as i16)?;

    // Stream format: BITMAPINFOHEADER
    w.write_all(b"strf")?;
    w.write_u32::<LittleEndian>(40)?;
    w.write_u32::<LittleEndian>(40)?;
    w.write_i32::<LittleEndian>(width as i32)?;
    w.write_i32::<LittleEndian>(height as i32)?;
    w.write_u16::<LittleEndian>(1)?; // planes
    w.write_u16::<LittleEndian>(codec.bit_count())?;
    w.write_all(codec.fourcc())?;
    w.write_u32::<LittleEndian>(frame_bytes)?;
    for _ in 0..4 {
        w.write_u32::<LittleEndian>(0)?; // resolution, palette
    }

    // LIST 'movi'
    w.write_all(b"LIST")?;
    let movi_size = w.stream_position()?;
    w.write_u32::<LittleEndian>(0)?;
    let movi_fourcc = w.stream_position()?;
    w.write_all(b"movi")?;

    Ok(Patches {
        riff_size,
        total_frames,
        stream_length,
        movi_size,
        movi_fourcc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVI_START: u64 = 224;

    #[test]
    fn test_size_limit_rejects_frame_and_keeps_file_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limit.avi");
        // Room for exactly two 8x8 raw frames: 2 chunks of 72 bytes and an
        // index of 8 + 2 * 16 bytes.
        let limit = MOVI_START + 2 * 72 + 8 + 32 - 8;
        let mut writer = AviWriter::create(&path, Codec::Raw, (8, 8), 10.0, 85)
            .unwrap()
            .with_size_limit(limit);

        let frame = Frame::filled(8, 8, 7, 0);
        writer.write_frame(&frame).unwrap();
        writer.write_frame(&frame).unwrap();
        let err = writer.write_frame(&frame).unwrap_err();
        assert!(matches!(err, MovieError::Output(ref m) if m.contains("size limit")));
        assert_eq!(writer.frames_written(), 2);
        writer.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as u64;
        assert_eq!(riff_size, bytes.len() as u64 - 8);
        assert_eq!(riff_size, limit);
        let total_frames = u32::from_le_bytes(bytes[48..52].try_into().unwrap());
        assert_eq!(total_frames, 2);
    }

    #[test]
    fn test_default_limit_is_riff_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let writer =
            AviWriter::create(&dir.path().join("a.avi"), Codec::Mjpg, (4, 4), 30.0, 85).unwrap();
        assert_eq!(writer.size_limit, u32::MAX as u64);
    }
}
