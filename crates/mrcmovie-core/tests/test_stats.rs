use std::cell::Cell;

use approx::assert_relative_eq;
use ndarray::{array, Array2};

use mrcmovie_core::error::{ErrorKind, MovieError, Result};
use mrcmovie_core::frame::Slice;
use mrcmovie_core::stats::{compute_global_stats, GlobalStats, RunningMinMax};

fn indexed(slices: Vec<Slice>) -> impl Iterator<Item = Result<(usize, Slice)>> {
    slices.into_iter().enumerate().map(Ok)
}

#[test]
fn test_bounds_span_all_slices() {
    let slices = vec![
        array![[1.0, 2.0], [3.0, 4.0]],
        array![[-5.0, 0.0], [0.0, 0.0]],
        array![[0.5, 9.5], [1.0, 1.0]],
    ];
    let stats = compute_global_stats(indexed(slices), |_| {}).unwrap();
    assert_relative_eq!(stats.min, -5.0);
    assert_relative_eq!(stats.max, 9.5);
    assert!(!stats.is_degenerate());
    assert_relative_eq!(stats.range(), 14.5);
}

#[test]
fn test_non_finite_samples_are_skipped() {
    let slices = vec![
        array![[f32::NAN, 2.0], [f32::INFINITY, 4.0]],
        array![[f32::NEG_INFINITY, 3.0], [1.0, f32::NAN]],
    ];
    let stats = compute_global_stats(indexed(slices), |_| {}).unwrap();
    assert_eq!(stats, GlobalStats { min: 1.0, max: 4.0 });
}

#[test]
fn test_all_nan_volume_is_degenerate_zero() {
    let slices = vec![Array2::from_elem((3, 3), f32::NAN)];
    let stats = compute_global_stats(indexed(slices), |_| {}).unwrap();
    assert_eq!(stats, GlobalStats { min: 0.0, max: 0.0 });
    assert!(stats.is_degenerate());
}

#[test]
fn test_constant_volume_is_degenerate() {
    let slices = vec![Array2::from_elem((2, 2), 7.0f32); 4];
    let stats = compute_global_stats(indexed(slices), |_| {}).unwrap();
    assert_eq!(stats.min, 7.0);
    assert!(stats.is_degenerate());
}

#[test]
fn test_progress_counts_slices() {
    let calls = Cell::new(Vec::new());
    let slices = vec![Array2::<f32>::zeros((1, 1)); 3];
    compute_global_stats(indexed(slices), |n| {
        let mut seen = calls.take();
        seen.push(n);
        calls.set(seen);
    })
    .unwrap();
    assert_eq!(calls.take(), vec![1, 2, 3]);
}

#[test]
fn test_read_error_propagates() {
    let items: Vec<Result<(usize, Slice)>> = vec![
        Ok((0, Array2::zeros((1, 1)))),
        Err(MovieError::SliceIndexOutOfRange { index: 1, depth: 1 }),
    ];
    let err = compute_global_stats(items, |_| {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_running_min_max_is_incremental() {
    let mut acc = RunningMinMax::new();
    assert_eq!(acc.finish(), GlobalStats { min: 0.0, max: 0.0 });

    acc.update(&array![[3.0, 5.0]]);
    acc.update(&array![[-1.0, 2.0]]);
    assert_eq!(acc.slices_seen(), 2);
    assert_eq!(acc.finish(), GlobalStats { min: -1.0, max: 5.0 });
}
