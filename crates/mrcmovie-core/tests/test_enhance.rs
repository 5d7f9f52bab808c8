use ndarray::{array, Array2};

use mrcmovie_core::enhance::{adaptive_clip_limit, ContrastEnhancer, EnhanceParams};
use mrcmovie_core::error::ErrorKind;
use mrcmovie_core::filters::clahe::clahe;
use mrcmovie_core::filters::normalize::normalize_to_u8;
use mrcmovie_core::stats::GlobalStats;

fn gradient(h: usize, w: usize) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| (r * w + c) as f32 * 0.37 - 20.0)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[test]
fn test_normalize_maps_bounds_to_full_range() {
    let stats = GlobalStats { min: -1.0, max: 1.0 };
    let out = normalize_to_u8(&array![[-1.0, 0.0, 1.0]], &stats);
    assert_eq!(out, array![[0u8, 127, 255]]);
}

#[test]
fn test_normalize_clips_outside_bounds() {
    let stats = GlobalStats { min: 0.0, max: 10.0 };
    let out = normalize_to_u8(&array![[-50.0, 50.0, f32::NAN]], &stats);
    assert_eq!(out, array![[0u8, 255, 0]]);
}

#[test]
fn test_normalize_degenerate_is_zero() {
    let stats = GlobalStats { min: 3.0, max: 3.0 };
    let out = normalize_to_u8(&Array2::from_elem((4, 4), 3.0), &stats);
    assert!(out.iter().all(|&v| v == 0));
}

// ---------------------------------------------------------------------------
// CLAHE
// ---------------------------------------------------------------------------

/// 16x16 image holding every 8-bit value exactly once.
fn all_levels() -> Array2<u8> {
    Array2::from_shape_fn((16, 16), |(r, c)| (r * 16 + c) as u8)
}

#[test]
fn test_single_tile_without_clip_is_plain_equalization() {
    let out = clahe(&all_levels(), 1, 0.0);
    for v in 0..256usize {
        let expected = ((v + 1) as f32 * 255.0 / 256.0).round() as u8;
        assert_eq!(out[[v / 16, v % 16]], expected, "level {v}");
    }
}

#[test]
fn test_flat_histogram_is_unaffected_by_clipping() {
    let image = all_levels();
    assert_eq!(clahe(&image, 1, 2.0), clahe(&image, 1, 0.0));
}

#[test]
fn test_clahe_preserves_shape_for_odd_sizes() {
    let image = Array2::from_shape_fn((37, 53), |(r, c)| ((r * 7 + c * 3) % 256) as u8);
    let out = clahe(&image, 8, 2.0);
    assert_eq!(out.dim(), (37, 53));
}

#[test]
fn test_clahe_grid_larger_than_image() {
    let image = Array2::from_shape_fn((3, 5), |(r, c)| (r * 40 + c * 10) as u8);
    let out = clahe(&image, 8, 2.0);
    assert_eq!(out.dim(), (3, 5));
}

#[test]
fn test_clahe_is_deterministic() {
    let image = Array2::from_shape_fn((64, 48), |(r, c)| ((r * r + c) % 200) as u8);
    assert_eq!(clahe(&image, 8, 3.0), clahe(&image, 8, 3.0));
}

// ---------------------------------------------------------------------------
// ContrastEnhancer
// ---------------------------------------------------------------------------

#[test]
fn test_enhance_keeps_shape_and_index() {
    let slice = gradient(20, 30);
    let stats = GlobalStats { min: -20.0, max: 200.0 };
    let enhancer = ContrastEnhancer::new(stats, EnhanceParams::default(), (20, 30));

    let frame = enhancer.enhance(&slice, 7).unwrap();
    assert_eq!((frame.height(), frame.width()), (20, 30));
    assert_eq!(frame.slice_index, 7);
    assert!(frame.data.iter().any(|&v| v > 0));
}

#[test]
fn test_enhance_degenerate_stats_gives_constant_frames() {
    let stats = GlobalStats { min: 5.0, max: 5.0 };
    let enhancer = ContrastEnhancer::new(stats, EnhanceParams::default(), (8, 8));

    let a = enhancer.enhance(&Array2::from_elem((8, 8), 5.0), 0).unwrap();
    let b = enhancer.enhance(&Array2::from_elem((8, 8), 5.0), 1).unwrap();
    assert!(a.data.iter().all(|&v| v == 0));
    assert_eq!(a.data, b.data);
}

#[test]
fn test_enhance_rejects_shape_mismatch() {
    let stats = GlobalStats { min: 0.0, max: 1.0 };
    let enhancer = ContrastEnhancer::new(stats, EnhanceParams::default(), (8, 8));
    let err = enhancer.enhance(&Array2::zeros((8, 9)), 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Processing);
}

#[test]
fn test_enhance_rejects_empty_slice() {
    let stats = GlobalStats { min: 0.0, max: 1.0 };
    let enhancer = ContrastEnhancer::new(stats, EnhanceParams::default(), (0, 8));
    let err = enhancer.enhance(&Array2::zeros((0, 8)), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Processing);
}

#[test]
fn test_enhance_is_pure() {
    let slice = gradient(32, 32);
    let stats = GlobalStats { min: -20.0, max: 400.0 };
    let params = EnhanceParams {
        clip_limit: 40.0,
        tile_grid_size: 4,
    };
    let enhancer = ContrastEnhancer::new(stats, params, (32, 32));
    assert_eq!(
        enhancer.enhance(&slice, 0).unwrap(),
        enhancer.enhance(&slice, 0).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Adaptive clip limit
// ---------------------------------------------------------------------------

#[test]
fn test_adaptive_clip_low_range_clamps_to_1_5() {
    assert_eq!(adaptive_clip_limit(2.0, 255.0), 2.0);
    assert_eq!(adaptive_clip_limit(0.2, 999.0), 1.0);
    assert_eq!(adaptive_clip_limit(40.0, 0.0), 5.0);
}

#[test]
fn test_adaptive_clip_medium_range_doubles_and_clamps_to_5_50() {
    assert_eq!(adaptive_clip_limit(2.0, 1000.0), 5.0);
    assert_eq!(adaptive_clip_limit(10.0, 5000.0), 20.0);
    assert_eq!(adaptive_clip_limit(100.0, 9999.0), 50.0);
}

#[test]
fn test_adaptive_clip_high_range_scales_by_ten_and_clamps_to_30_1000() {
    assert_eq!(adaptive_clip_limit(2.0, 10_000.0), 30.0);
    assert_eq!(adaptive_clip_limit(5.0, 65_535.0), 50.0);
    assert_eq!(adaptive_clip_limit(500.0, 1.0e6), 1000.0);
}

#[test]
fn test_adapted_params_keep_tile_grid() {
    let params = EnhanceParams {
        clip_limit: 3.0,
        tile_grid_size: 4,
    };
    let stats = GlobalStats {
        min: -2000.0,
        max: 3000.0,
    };
    let adapted = params.adapted_to(&stats);
    assert_eq!(adapted.clip_limit, 6.0);
    assert_eq!(adapted.tile_grid_size, 4);
}
