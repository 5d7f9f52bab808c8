use std::fmt;
use std::path::PathBuf;

use ndarray::Array2;

/// One decoded 2D plane of a volume, shape = (height, width).
/// Samples keep their source scale (no rescaling on read).
pub type Slice = Array2<f32>;

/// A single 8-bit grayscale output frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<u8>,
    /// Depth index of the slice this frame was produced from
    pub slice_index: usize,
}

impl Frame {
    pub fn new(data: Array2<u8>, slice_index: usize) -> Self {
        Self { data, slice_index }
    }

    /// A frame with every pixel set to `value`.
    pub fn filled(height: usize, width: usize, value: u8, slice_index: usize) -> Self {
        Self::new(Array2::from_elem((height, width), value), slice_index)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Row-major pixel bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }
}

/// Element type of the volume's data block (MRC `mode` word).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataMode {
    Int8,
    Int16,
    Float32,
    Uint16,
    Float16,
}

impl DataMode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Int8),
            1 => Some(Self::Int16),
            2 => Some(Self::Float32),
            6 => Some(Self::Uint16),
            12 => Some(Self::Float16),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Int8 => 0,
            Self::Int16 => 1,
            Self::Float32 => 2,
            Self::Uint16 => 6,
            Self::Float16 => 12,
        }
    }

    /// Bytes per sample.
    pub fn itemsize(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 | Self::Uint16 | Self::Float16 => 2,
            Self::Float32 => 4,
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8 => write!(f, "int8"),
            Self::Int16 => write!(f, "int16"),
            Self::Float32 => write!(f, "float32"),
            Self::Uint16 => write!(f, "uint16"),
            Self::Float16 => write!(f, "float16"),
        }
    }
}

/// Metadata about the source volume.
#[derive(Clone, Debug)]
pub struct VolumeInfo {
    pub filename: PathBuf,
    pub depth: usize,
    pub height: usize,
    pub width: usize,
    pub mode: DataMode,
    pub little_endian: bool,
    pub extended_header_bytes: usize,
}

impl VolumeInfo {
    /// Size of the data block in bytes.
    pub fn data_bytes(&self) -> u64 {
        self.depth as u64 * self.height as u64 * self.width as u64 * self.mode.itemsize() as u64
    }
}
