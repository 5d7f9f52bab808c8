mod common;

use approx::assert_relative_eq;

use common::*;
use mrcmovie_core::error::{ErrorKind, MovieError};
use mrcmovie_core::frame::DataMode;
use mrcmovie_core::io::mrc::MrcReader;

#[test]
fn test_open_float32_volume() {
    let data = build_mrc_f32(4, 3, &ramp_slices(4, 3, 2));
    let tmp = write_test_mrc(&data);

    let reader = MrcReader::open(tmp.path()).unwrap();
    assert_eq!(reader.depth(), 2);
    assert_eq!(reader.height(), 3);
    assert_eq!(reader.width(), 4);
    assert_eq!(reader.mode(), DataMode::Float32);
    assert!(reader.header.little_endian);

    let slice = reader.slice_at(1).unwrap();
    assert_eq!(slice.dim(), (3, 4));
    assert_relative_eq!(slice[[0, 0]], 1000.0);
    assert_relative_eq!(slice[[2, 3]], 1011.0);
}

#[test]
fn test_int16_and_uint16_decode() {
    let mut data = build_mrc_header(2, 1, 1, MODE_INT16, 0);
    data.extend_from_slice(&(-300i16).to_le_bytes());
    data.extend_from_slice(&(1200i16).to_le_bytes());
    let tmp = write_test_mrc(&data);
    let slice = MrcReader::open(tmp.path()).unwrap().slice_at(0).unwrap();
    assert_eq!(slice[[0, 0]], -300.0);
    assert_eq!(slice[[0, 1]], 1200.0);

    let mut data = build_mrc_header(2, 1, 1, MODE_UINT16, 0);
    data.extend_from_slice(&60000u16.to_le_bytes());
    data.extend_from_slice(&7u16.to_le_bytes());
    let tmp = write_test_mrc(&data);
    let slice = MrcReader::open(tmp.path()).unwrap().slice_at(0).unwrap();
    assert_eq!(slice[[0, 0]], 60000.0);
    assert_eq!(slice[[0, 1]], 7.0);
}

#[test]
fn test_int8_is_signed() {
    let mut data = build_mrc_header(3, 1, 1, MODE_INT8, 0);
    data.extend_from_slice(&[0x80, 0xff, 0x7f]);
    let tmp = write_test_mrc(&data);
    let slice = MrcReader::open(tmp.path()).unwrap().slice_at(0).unwrap();
    assert_eq!(slice.iter().copied().collect::<Vec<_>>(), vec![-128.0, -1.0, 127.0]);
}

#[test]
fn test_float16_decode() {
    let mut data = build_mrc_header(4, 1, 1, MODE_FLOAT16, 0);
    data.extend_from_slice(&0x3c00u16.to_le_bytes()); // 1.0
    data.extend_from_slice(&0xc100u16.to_le_bytes()); // -2.5
    data.extend_from_slice(&0x7bffu16.to_le_bytes()); // largest finite half
    data.extend_from_slice(&0x7c00u16.to_le_bytes()); // +inf
    let tmp = write_test_mrc(&data);
    let reader = MrcReader::open(tmp.path()).unwrap();
    assert_eq!(reader.mode(), DataMode::Float16);
    let slice = reader.slice_at(0).unwrap();
    assert_eq!(slice[[0, 0]], 1.0);
    assert_eq!(slice[[0, 1]], -2.5);
    assert_eq!(slice[[0, 2]], 65504.0);
    assert!(slice[[0, 3]].is_infinite());
}

#[test]
fn test_big_endian_volume() {
    let mut data = build_mrc_header_be(2, 2, 1, MODE_FLOAT32);
    for v in [1.5f32, -2.0, 3.25, 100.0] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    let tmp = write_test_mrc(&data);
    let reader = MrcReader::open(tmp.path()).unwrap();
    assert!(!reader.header.little_endian);
    assert_eq!((reader.depth(), reader.height(), reader.width()), (1, 2, 2));
    let slice = reader.slice_at(0).unwrap();
    assert_eq!(slice[[0, 0]], 1.5);
    assert_eq!(slice[[0, 1]], -2.0);
    assert_eq!(slice[[1, 0]], 3.25);
    assert_eq!(slice[[1, 1]], 100.0);
}

#[test]
fn test_extended_header_is_skipped() {
    let mut data = build_mrc_header(2, 1, 1, MODE_FLOAT32, 8);
    data.extend_from_slice(&[0xAB; 8]);
    data.extend_from_slice(&5.0f32.to_le_bytes());
    data.extend_from_slice(&6.0f32.to_le_bytes());
    let tmp = write_test_mrc(&data);

    let reader = MrcReader::open(tmp.path()).unwrap();
    assert_eq!(reader.volume_info().extended_header_bytes, 8);
    let slice = reader.slice_at(0).unwrap();
    assert_eq!(slice[[0, 0]], 5.0);
    assert_eq!(slice[[0, 1]], 6.0);
}

#[test]
fn test_truncated_file_is_input_error() {
    let mut data = build_mrc_f32(4, 4, &ramp_slices(4, 4, 3));
    data.truncate(data.len() - 10);
    let tmp = write_test_mrc(&data);

    let err = MrcReader::open(tmp.path()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(err.to_string().contains("truncated"));
}

#[test]
fn test_short_file_is_input_error() {
    let tmp = write_test_mrc(&[0u8; 100]);
    let err = MrcReader::open(tmp.path()).err().unwrap();
    assert!(matches!(err, MovieError::Input { .. }));
}

#[test]
fn test_unsupported_mode_is_input_error() {
    let mut data = build_mrc_header(2, 2, 1, 4, 0); // complex float
    data.extend_from_slice(&[0u8; 32]);
    let tmp = write_test_mrc(&data);
    let err = MrcReader::open(tmp.path()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(err.to_string().contains("mode 4"));
}

#[test]
fn test_zero_dimension_is_input_error() {
    let data = build_mrc_header(0, 2, 1, MODE_FLOAT32, 0);
    let tmp = write_test_mrc(&data);
    assert_eq!(MrcReader::open(tmp.path()).err().unwrap().kind(), ErrorKind::Input);
}

#[test]
fn test_missing_file_is_input_error() {
    let err = MrcReader::open(std::path::Path::new("/nonexistent/volume.mrc"))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_slice_index_out_of_range() {
    let tmp = write_test_mrc(&build_mrc_f32(2, 2, &ramp_slices(2, 2, 3)));
    let reader = MrcReader::open(tmp.path()).unwrap();
    let err = reader.slice_at(3).unwrap_err();
    assert!(matches!(
        err,
        MovieError::SliceIndexOutOfRange { index: 3, depth: 3 }
    ));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_slices_iterator_is_ordered_and_restartable() {
    let tmp = write_test_mrc(&build_mrc_f32(2, 2, &ramp_slices(2, 2, 5)));
    let reader = MrcReader::open(tmp.path()).unwrap();

    let first: Vec<usize> = reader.slices(1..4).map(|r| r.unwrap().0).collect();
    assert_eq!(first, vec![1, 2, 3]);

    let again: Vec<f32> = reader
        .slices(1..4)
        .map(|r| r.unwrap().1[[0, 0]])
        .collect();
    assert_eq!(again, vec![1000.0, 2000.0, 3000.0]);
}

#[test]
fn test_volume_info() {
    let tmp = write_test_mrc(&build_mrc_f32(8, 4, &ramp_slices(8, 4, 3)));
    let info = MrcReader::open(tmp.path()).unwrap().volume_info();
    assert_eq!((info.depth, info.height, info.width), (3, 4, 8));
    assert_eq!(info.mode, DataMode::Float32);
    assert_eq!(info.data_bytes(), 3 * 4 * 8 * 4);
    assert_eq!(info.filename, tmp.path());
}
