use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;
use memmap2::Mmap;
use ndarray::Array2;
use tracing::{debug, info};

use crate::consts::MRC_HEADER_SIZE;
use crate::error::{MovieError, Result};
use crate::frame::{DataMode, Slice, VolumeInfo};

/// Byte offset of the `nsymbt` word (extended header length).
const NSYMBT_OFFSET: usize = 92;
/// Byte offset of the two-byte machine stamp.
const MACHST_OFFSET: usize = 212;

/// The parts of the MRC2014 main header needed to locate and decode the data block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MrcHeader {
    /// Columns (fastest-varying axis)
    pub nx: usize,
    /// Rows
    pub ny: usize,
    /// Sections (slices)
    pub nz: usize,
    pub mode: DataMode,
    pub little_endian: bool,
    /// Length of the extended header that precedes the data block.
    pub nsymbt: usize,
}

impl MrcHeader {
    /// Bytes per slice.
    pub fn slice_byte_size(&self) -> Option<usize> {
        self.nx
            .checked_mul(self.ny)?
            .checked_mul(self.mode.itemsize())
    }

    /// Offset of the first data byte from the start of the file.
    pub fn data_offset(&self) -> usize {
        MRC_HEADER_SIZE + self.nsymbt
    }

    /// Total bytes of the data block.
    pub fn data_byte_size(&self) -> Option<usize> {
        self.slice_byte_size()?.checked_mul(self.nz)
    }
}

/// Memory-mapped MRC volume reader.
///
/// Slices are decoded on demand from the mapping; nothing is read eagerly.
/// The file handle is released when the reader is dropped.
pub struct MrcReader {
    mmap: Mmap,
    path: PathBuf,
    pub header: MrcHeader,
}

impl MrcReader {
    /// Open an MRC file, parse and validate its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| MovieError::input(path, format!("cannot open file: {e}")))?;
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| MovieError::input(path, format!("cannot map file: {e}")))?;

        if mmap.len() < MRC_HEADER_SIZE {
            return Err(MovieError::input(
                path,
                format!(
                    "file too small for MRC header ({} bytes, need {MRC_HEADER_SIZE})",
                    mmap.len()
                ),
            ));
        }

        let header = parse_header(&mmap[..MRC_HEADER_SIZE])
            .map_err(|reason| MovieError::input(path, reason))?;

        let expected = header
            .data_byte_size()
            .and_then(|n| n.checked_add(header.data_offset()))
            .ok_or_else(|| MovieError::input(path, "volume dimensions overflow"))?;
        if mmap.len() < expected {
            return Err(MovieError::input(
                path,
                format!(
                    "file truncated: expected at least {} bytes, got {}",
                    expected,
                    mmap.len()
                ),
            ));
        }

        info!(
            path = %path.display(),
            depth = header.nz,
            height = header.ny,
            width = header.nx,
            mode = %header.mode,
            "Opened MRC volume"
        );

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.header.nz
    }

    pub fn height(&self) -> usize {
        self.header.ny
    }

    pub fn width(&self) -> usize {
        self.header.nx
    }

    pub fn mode(&self) -> DataMode {
        self.header.mode
    }

    /// Raw bytes of one slice (zero-copy from the mapping).
    pub fn slice_raw(&self, index: usize) -> Result<&[u8]> {
        let depth = self.depth();
        if index >= depth {
            return Err(MovieError::SliceIndexOutOfRange { index, depth });
        }
        // Both sizes were overflow-checked in `open`.
        let size = self.header.nx * self.header.ny * self.header.mode.itemsize();
        let offset = self.header.data_offset() + index * size;
        Ok(&self.mmap[offset..offset + size])
    }

    /// Decode slice `index` to f32, keeping the source value scale.
    pub fn slice_at(&self, index: usize) -> Result<Slice> {
        let raw = self.slice_raw(index)?;
        let samples = if self.header.little_endian {
            decode_samples::<LittleEndian>(raw, self.header.mode)
        } else {
            decode_samples::<BigEndian>(raw, self.header.mode)
        };
        Array2::from_shape_vec((self.header.ny, self.header.nx), samples)
            .map_err(|e| MovieError::Processing(format!("slice {index}: {e}")))
    }

    /// Lazily decode the slices in `range`, one at a time, in index order.
    ///
    /// Each call starts a fresh traversal, so several passes can walk the
    /// same range independently.
    pub fn slices(&self, range: Range<usize>) -> impl Iterator<Item = Result<(usize, Slice)>> + '_ {
        range.map(move |i| self.slice_at(i).map(|s| (i, s)))
    }

    pub fn volume_info(&self) -> VolumeInfo {
        VolumeInfo {
            filename: self.path.clone(),
            depth: self.depth(),
            height: self.height(),
            width: self.width(),
            mode: self.mode(),
            little_endian: self.header.little_endian,
            extended_header_bytes: self.header.nsymbt,
        }
    }
}

/// Parse the fields of the 1024-byte main header we rely on.
pub fn parse_header(buf: &[u8]) -> std::result::Result<MrcHeader, String> {
    if buf.len() < MRC_HEADER_SIZE {
        return Err(format!("header is {} bytes, need {MRC_HEADER_SIZE}", buf.len()));
    }

    // Machine stamp: 0x44 0x44 / 0x44 0x41 little-endian, 0x11 0x11 big-endian.
    // Old writers leave it zeroed; those files are little-endian in practice.
    let little_endian = buf[MACHST_OFFSET] != 0x11;
    let (words, nsymbt) = if little_endian {
        read_words::<LittleEndian>(buf)
    } else {
        read_words::<BigEndian>(buf)
    };
    let [nx, ny, nz, mode_code] = words;
    debug!(nx, ny, nz, mode_code, nsymbt, little_endian, "Parsed MRC header");

    if nx <= 0 || ny <= 0 || nz <= 0 {
        return Err(format!("invalid dimensions {nx}x{ny}x{nz}"));
    }
    let mode = DataMode::from_code(mode_code)
        .ok_or_else(|| format!("unsupported data mode {mode_code}"))?;
    if nsymbt < 0 {
        return Err(format!("negative extended header length {nsymbt}"));
    }

    Ok(MrcHeader {
        nx: nx as usize,
        ny: ny as usize,
        nz: nz as usize,
        mode,
        little_endian,
        nsymbt: nsymbt as usize,
    })
}

fn read_words<B: ByteOrder>(buf: &[u8]) -> ([i32; 4], i32) {
    let words = [
        B::read_i32(&buf[0..4]),
        B::read_i32(&buf[4..8]),
        B::read_i32(&buf[8..12]),
        B::read_i32(&buf[12..16]),
    ];
    let nsymbt = B::read_i32(&buf[NSYMBT_OFFSET..NSYMBT_OFFSET + 4]);
    (words, nsymbt)
}

fn decode_samples<B: ByteOrder>(raw: &[u8], mode: DataMode) -> Vec<f32> {
    match mode {
        DataMode::Int8 => raw.iter().map(|&b| b as i8 as f32).collect(),
        DataMode::Int16 => raw.chunks_exact(2).map(|c| B::read_i16(c) as f32).collect(),
        DataMode::Uint16 => raw.chunks_exact(2).map(|c| B::read_u16(c) as f32).collect(),
        DataMode::Float16 => raw
            .chunks_exact(2)
            .map(|c| f16::from_bits(B::read_u16(c)).to_f32())
            .collect(),
        DataMode::Float32 => raw.chunks_exact(4).map(B::read_f32).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_stamp() {
        let mut buf = vec![0u8; MRC_HEADER_SIZE];
        BigEndian::write_i32(&mut buf[0..4], 3);
        BigEndian::write_i32(&mut buf[4..8], 2);
        BigEndian::write_i32(&mut buf[8..12], 5);
        BigEndian::write_i32(&mut buf[12..16], 1);
        buf[MACHST_OFFSET] = 0x11;
        buf[MACHST_OFFSET + 1] = 0x11;

        let header = parse_header(&buf).unwrap();
        assert!(!header.little_endian);
        assert_eq!((header.nx, header.ny, header.nz), (3, 2, 5));
        assert_eq!(header.mode, DataMode::Int16);
    }
}
