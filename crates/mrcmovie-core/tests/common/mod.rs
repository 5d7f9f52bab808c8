#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::GrayImage;
use ndarray::Array2;

use mrcmovie_core::consts::MRC_HEADER_SIZE;
use mrcmovie_core::frame::Frame;

/// Mode codes as stored in the header.
pub const MODE_INT8: i32 = 0;
pub const MODE_INT16: i32 = 1;
pub const MODE_FLOAT32: i32 = 2;
pub const MODE_UINT16: i32 = 6;
pub const MODE_FLOAT16: i32 = 12;

/// Build a little-endian MRC2014 main header.
///
/// Returns just the 1024-byte header; append `nsymbt` bytes of extended
/// header and then the voxel data.
pub fn build_mrc_header(nx: i32, ny: i32, nz: i32, mode: i32, nsymbt: i32) -> Vec<u8> {
    let mut buf = vec![0u8; MRC_HEADER_SIZE];
    buf[0..4].copy_from_slice(&nx.to_le_bytes());
    buf[4..8].copy_from_slice(&ny.to_le_bytes());
    buf[8..12].copy_from_slice(&nz.to_le_bytes());
    buf[12..16].copy_from_slice(&mode.to_le_bytes());
    // MX, MY, MZ
    buf[28..32].copy_from_slice(&nx.to_le_bytes());
    buf[32..36].copy_from_slice(&ny.to_le_bytes());
    buf[36..40].copy_from_slice(&nz.to_le_bytes());
    // NSYMBT
    buf[92..96].copy_from_slice(&nsymbt.to_le_bytes());
    // MAP identifier and machine stamp
    buf[208..212].copy_from_slice(b"MAP ");
    buf[212] = 0x44;
    buf[213] = 0x44;
    buf
}

/// Big-endian counterpart of [`build_mrc_header`].
pub fn build_mrc_header_be(nx: i32, ny: i32, nz: i32, mode: i32) -> Vec<u8> {
    let mut buf = vec![0u8; MRC_HEADER_SIZE];
    buf[0..4].copy_from_slice(&nx.to_be_bytes());
    buf[4..8].copy_from_slice(&ny.to_be_bytes());
    buf[8..12].copy_from_slice(&nz.to_be_bytes());
    buf[12..16].copy_from_slice(&mode.to_be_bytes());
    buf[208..212].copy_from_slice(b"MAP ");
    buf[212] = 0x11;
    buf[213] = 0x11;
    buf
}

/// Build a complete float32 volume; `slices[z]` holds `ny * nx` values in
/// row-major order.
pub fn build_mrc_f32(nx: usize, ny: usize, slices: &[Vec<f32>]) -> Vec<u8> {
    let mut buf = build_mrc_header(nx as i32, ny as i32, slices.len() as i32, MODE_FLOAT32, 0);
    for slice in slices {
        assert_eq!(slice.len(), nx * ny);
        for v in slice {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

/// A volume whose voxel at (z, y, x) is `z * 1000 + y * nx + x`.
pub fn ramp_slices(nx: usize, ny: usize, nz: usize) -> Vec<Vec<f32>> {
    (0..nz)
        .map(|z| {
            (0..nx * ny)
                .map(|i| (z * 1000 + i) as f32)
                .collect()
        })
        .collect()
}

/// Write an MRC buffer to a temporary `.mrc` file.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_test_mrc(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::Builder::new()
        .suffix(".mrc")
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write MRC data");
    f.flush().expect("flush");
    f
}

/// Write an MRC buffer to `dir/name` and return its path.
pub fn write_mrc_in(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write MRC file");
    path
}

/// Read a written PNG back as an 8-bit frame.
pub fn load_png(path: &Path, slice_index: usize) -> Frame {
    let gray: GrayImage = image::open(path).unwrap().to_luma8();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_vec((h as usize, w as usize), gray.into_raw()).unwrap();
    Frame::new(data, slice_index)
}
